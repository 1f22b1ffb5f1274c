// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScreenshotSettings;
use crate::engines::traits::{EngineError, ScreenshotEngine};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Chromium截图引擎
///
/// 基于chromiumoxide驱动无头浏览器。浏览器实例在第一次截图时
/// 启动（或连接远程实例）并在之后的截图中复用。
pub struct ChromiumScreenshotEngine {
    browser: OnceCell<Browser>,
    remote_debugging_url: Option<String>,
    settle_delay: Duration,
    timeout: Duration,
}

impl ChromiumScreenshotEngine {
    pub fn new(settings: &ScreenshotSettings) -> Self {
        Self {
            browser: OnceCell::new(),
            remote_debugging_url: settings.remote_debugging_url.clone(),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    async fn browser(&self) -> Result<&Browser, EngineError> {
        self.browser
            .get_or_try_init(|| async {
                let (browser, mut handler) = if let Some(url) = &self.remote_debugging_url {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url).await.map_err(|e| {
                        EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let config = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(self.timeout)
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage")
                        .build()
                        .map_err(EngineError::Browser)?;

                    info!("Launching headless Chrome");
                    Browser::launch(config)
                        .await
                        .map_err(|e| EngineError::Browser(e.to_string()))?
                };

                // Drive browser events until the connection closes
                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                Ok(browser)
            })
            .await
    }
}

#[async_trait]
impl ScreenshotEngine for ChromiumScreenshotEngine {
    /// 导航到目标页面，等待稳定后截取视口PNG
    async fn capture(&self, url: &str) -> Result<Vec<u8>, EngineError> {
        tokio::time::timeout(self.timeout, async {
            let browser = self.browser().await?;

            let page = browser
                .new_page(url)
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            tokio::time::sleep(self.settle_delay).await;

            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(false)
                .build();

            let bytes = page
                .screenshot(params)
                .await
                .map_err(|e| EngineError::Browser(format!("Page screenshot failed: {}", e)));

            if let Err(e) = page.close().await {
                debug!("Failed to close page for {}: {}", url, e);
            }

            bytes
        })
        .await
        .map_err(|_| EngineError::Timeout)?
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
