// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 目标返回了错误状态码
    #[error("fetch status {0}")]
    HttpStatus(u16),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 浏览器错误
    #[error("Browser error: {0}")]
    Browser(String),
}

/// 页面抓取特质
///
/// 对目标URL执行GET请求并返回响应正文；
/// 传输失败或状态码 >= 400 时返回错误
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, EngineError>;
}

/// 链接可用性检查特质
#[async_trait]
pub trait LinkChecker: Send + Sync {
    /// 对链接发起HEAD请求，状态码 >= 400 或请求失败时视为失效
    async fn is_broken(&self, url: &str) -> bool;
}

/// 截图引擎特质
///
/// 输入URL，页面稳定后返回视口的PNG字节，不做重试
#[async_trait]
pub trait ScreenshotEngine: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Vec<u8>, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
