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

use crate::config::settings::CrawlerSettings;
use crate::engines::traits::{EngineError, LinkChecker, PageFetcher};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// HTTP引擎
///
/// 基于reqwest实现页面抓取与链接检查。两类请求使用各自的客户端，
/// 以便分别应用抓取超时和HEAD超时。
#[derive(Clone)]
pub struct ReqwestEngine {
    fetch_client: reqwest::Client,
    head_client: reqwest::Client,
}

impl ReqwestEngine {
    /// 根据爬取配置创建引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 爬取管道配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 创建成功
    /// * `Err(EngineError)` - 客户端构建失败
    pub fn new(settings: &CrawlerSettings) -> Result<Self, EngineError> {
        let fetch_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()?;

        let head_client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.link_check_timeout_secs))
            .build()?;

        Ok(Self {
            fetch_client,
            head_client,
        })
    }
}

#[async_trait]
impl PageFetcher for ReqwestEngine {
    async fn fetch(&self, url: &str) -> Result<String, EngineError> {
        let response = self.fetch_client.get(url).send().await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(EngineError::HttpStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl LinkChecker for ReqwestEngine {
    async fn is_broken(&self, url: &str) -> bool {
        match self.head_client.head(url).send().await {
            Ok(response) => response.status().as_u16() >= 400,
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
