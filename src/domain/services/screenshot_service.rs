// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use crate::engines::traits::{EngineError, ScreenshotEngine};
use crate::utils::url_utils::screenshot_file_name;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 截图错误类型
#[derive(Error, Debug)]
pub enum ScreenshotError {
    /// 浏览器截图失败
    #[error("screenshot capture failed: {0}")]
    Capture(#[from] EngineError),
    /// 截图保存失败
    #[error("screenshot storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// 截图服务
///
/// 调用截图引擎获取PNG并写入存储，返回保存的文件名
#[derive(Clone)]
pub struct ScreenshotService {
    engine: Arc<dyn ScreenshotEngine>,
    storage: Arc<dyn StorageRepository>,
    fail_crawl_on_error: bool,
}

impl ScreenshotService {
    pub fn new(
        engine: Arc<dyn ScreenshotEngine>,
        storage: Arc<dyn StorageRepository>,
        fail_crawl_on_error: bool,
    ) -> Self {
        Self {
            engine,
            storage,
            fail_crawl_on_error,
        }
    }

    /// 截图失败时是否中止整个爬取
    pub fn fail_crawl_on_error(&self) -> bool {
        self.fail_crawl_on_error
    }

    /// 截取页面并保存为 `<unix纳秒>-<slug>.png`
    pub async fn capture(&self, url: &str) -> Result<String, ScreenshotError> {
        let bytes = self.engine.capture(url).await?;

        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let name = screenshot_file_name(url, nanos);
        self.storage.save(&name, &bytes).await?;

        debug!(engine = self.engine.name(), file = %name, size = bytes.len(), "Screenshot stored");
        Ok(name)
    }
}
