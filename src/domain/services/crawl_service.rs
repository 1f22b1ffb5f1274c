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
use crate::domain::models::crawl_result::CrawlResult;
use crate::domain::services::html_version::detect_html_version;
use crate::domain::services::link_analyzer::analyze_links;
use crate::domain::services::page_analyzer::analyze_document;
use crate::domain::services::screenshot_service::{ScreenshotError, ScreenshotService};
use crate::engines::traits::{EngineError, LinkChecker, PageFetcher};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// 爬取错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 目标URL不是合法的 http(s) 绝对地址
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// 页面抓取失败
    #[error("{0}")]
    Fetch(EngineError),
    /// 文档无法解析
    #[error("parse error: {0}")]
    Parse(String),
    /// 截图失败
    #[error("{0}")]
    Screenshot(#[from] ScreenshotError),
    /// 执行上下文已取消
    #[error("crawl cancelled")]
    Cancelled,
}

/// 爬取管道特质
///
/// 对单个URL执行完整的爬取流程，产出一个 `CrawlResult`
#[async_trait]
pub trait Crawler: Send + Sync {
    async fn crawl(&self, url: &str, cancel: &CancellationToken)
        -> Result<CrawlResult, CrawlError>;
}

/// 爬取服务
///
/// 按顺序执行：抓取 → 解析 → 提取页面信息 → 链接统计与检查 →
/// 文档版本识别 → 可选截图。任一步骤失败即中止，不返回部分结果。
/// 取消令牌贯穿每个会阻塞的步骤。
pub struct CrawlService {
    fetcher: Arc<dyn PageFetcher>,
    link_checker: Arc<dyn LinkChecker>,
    screenshots: Option<ScreenshotService>,
    link_check_concurrency: usize,
}

impl CrawlService {
    /// 创建新的爬取服务实例
    ///
    /// # 参数
    ///
    /// * `fetcher` - 页面抓取实现
    /// * `link_checker` - 链接检查实现
    /// * `settings` - 爬取管道配置
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        link_checker: Arc<dyn LinkChecker>,
        settings: &CrawlerSettings,
    ) -> Self {
        Self {
            fetcher,
            link_checker,
            screenshots: None,
            link_check_concurrency: settings.link_check_concurrency,
        }
    }

    /// 启用截图步骤
    pub fn with_screenshots(mut self, screenshots: ScreenshotService) -> Self {
        self.screenshots = Some(screenshots);
        self
    }

    async fn capture_screenshot(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, CrawlError> {
        let Some(screenshots) = &self.screenshots else {
            return Ok(None);
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
            outcome = screenshots.capture(url) => outcome,
        };

        match outcome {
            Ok(name) => Ok(Some(name)),
            Err(e) if screenshots.fail_crawl_on_error() => Err(e.into()),
            Err(e) => {
                warn!("Screenshot of {} failed, continuing without it: {}", url, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Crawler for CrawlService {
    async fn crawl(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        let page_url = Url::parse(url).map_err(|e| CrawlError::InvalidUrl(e.to_string()))?;
        if !matches!(page_url.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidUrl(format!(
                "unsupported scheme: {}",
                page_url.scheme()
            )));
        }

        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
            body = self.fetcher.fetch(url) => body.map_err(CrawlError::Fetch)?,
        };
        debug!("Fetched {} ({} bytes)", url, body.len());

        // The parsed tree is not Send, so it never lives across an await
        let analysis = analyze_document(&body);

        let links = analyze_links(
            &analysis.links,
            &page_url,
            self.link_checker.as_ref(),
            self.link_check_concurrency,
            cancel,
        )
        .await
        .map_err(|_| CrawlError::Cancelled)?;

        let html_version = detect_html_version(&body).to_string();
        let screenshot_path = self.capture_screenshot(url, cancel).await?;

        Ok(CrawlResult {
            title: analysis.info.title,
            headings: analysis.info.headings,
            internal_links: links.internal,
            external_links: links.external,
            broken_links: links.broken,
            has_login_form: analysis.info.has_login_form,
            html_version,
            screenshot_path,
        })
    }
}

#[cfg(test)]
#[path = "crawl_service_test.rs"]
mod tests;
