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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、工作池、爬取管道、截图、存储和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 工作池配置
    pub worker: WorkerSettings,
    /// 爬取管道配置
    pub crawler: CrawlerSettings,
    /// 截图配置
    pub screenshot: ScreenshotSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 工作池配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 并发工作器数量
    pub count: usize,
    /// 队列为空时两次认领之间的等待时间（毫秒）
    pub poll_interval_ms: u64,
}

impl WorkerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 校验工作池配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::Message(
                "worker.count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: 3,
            poll_interval_ms: 2000,
        }
    }
}

/// 爬取管道配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 页面抓取超时（秒）
    pub fetch_timeout_secs: u64,
    /// 单个链接HEAD检查超时（秒）
    pub link_check_timeout_secs: u64,
    /// 链接检查使用的User-Agent
    pub user_agent: String,
    /// 同时进行的链接检查数量
    pub link_check_concurrency: usize,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            link_check_timeout_secs: 10,
            user_agent: "spydr-crawler/1.0".to_string(),
            link_check_concurrency: 8,
        }
    }
}

/// 截图配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenshotSettings {
    /// 是否启用截图
    pub enabled: bool,
    /// 页面加载后等待动态内容的时间（毫秒）
    pub settle_delay_ms: u64,
    /// 浏览器操作整体超时（秒）
    pub timeout_secs: u64,
    /// 远程 Chrome 调试地址，未设置时在本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 截图失败时是否让整个爬取失败
    pub fail_crawl_on_error: bool,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            settle_delay_ms: 2000,
            timeout_secs: 30,
            remote_debugging_url: None,
            fail_crawl_on_error: true,
        }
    }
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local)
    pub storage_type: String,
    /// 本地存储路径 (当 type=local 时使用)
    pub local_path: Option<String>,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SPYDR").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.worker.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Default DB settings
            .set_default("database.url", "sqlite://spydr.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default worker pool settings
            .set_default("worker.count", 3)?
            .set_default("worker.poll_interval_ms", 2000)?
            // Default crawler settings
            .set_default("crawler.fetch_timeout_secs", 15)?
            .set_default("crawler.link_check_timeout_secs", 10)?
            .set_default("crawler.user_agent", "spydr-crawler/1.0")?
            .set_default("crawler.link_check_concurrency", 8)?
            // Default screenshot settings
            .set_default("screenshot.enabled", true)?
            .set_default("screenshot.settle_delay_ms", 2000)?
            .set_default("screenshot.timeout_secs", 30)?
            .set_default("screenshot.fail_crawl_on_error", true)?
            // Default Storage settings
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./screenshots")?
            // Default metrics settings
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
