// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::WorkerSettings;
use crate::domain::repositories::crawl_job_repository::CrawlJobRepository;
use crate::domain::services::crawl_service::Crawler;
use crate::workers::cancellation::CancellationRegistry;
use crate::workers::crawl_worker::CrawlWorker;
use crate::workers::worker::Worker;
use config::ConfigError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 工作池
///
/// 持有固定数量的爬取工作器，以及它们共享的任务仓库、爬取管道和取消注册表。
/// 所有依赖在构造时注入。
pub struct WorkerPool {
    repository: Arc<dyn CrawlJobRepository>,
    crawler: Arc<dyn Crawler>,
    registry: CancellationRegistry,
    settings: WorkerSettings,
    shutdown: Option<CancellationToken>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// 创建工作池，工作器数量为0时返回配置错误
    pub fn new(
        repository: Arc<dyn CrawlJobRepository>,
        crawler: Arc<dyn Crawler>,
        registry: CancellationRegistry,
        settings: WorkerSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        Ok(Self {
            repository,
            crawler,
            registry,
            settings,
            shutdown: None,
            handles: Vec::new(),
        })
    }

    /// 启动工作器
    ///
    /// 按配置的数量启动工作器；已在运行时忽略
    pub fn start(&mut self) {
        if self.shutdown.is_some() {
            warn!("Worker pool already running");
            return;
        }

        let shutdown = CancellationToken::new();
        for id in 0..self.settings.count {
            let worker = CrawlWorker::new(
                id,
                self.repository.clone(),
                self.crawler.clone(),
                self.registry.clone(),
                self.settings.poll_interval(),
                shutdown.clone(),
            );

            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("Worker {} exited with error: {}", worker.name(), e);
                }
            });
            self.handles.push(handle);
        }

        self.shutdown = Some(shutdown);
        info!(
            workers = self.settings.count,
            poll_interval_ms = self.settings.poll_interval_ms,
            "Worker pool started"
        );
    }

    /// 停止工作器并等待它们退出
    ///
    /// 工作器在下一个循环边界退出，正在执行的任务会先完成并持久化
    pub async fn stop(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };

        info!(
            in_flight = self.registry.len(),
            "Shutting down workers..."
        );
        shutdown.cancel();

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Worker task ended abnormally: {}", e);
            }
        }

        info!("Workers shut down successfully");
    }

    /// 取消正在执行的任务
    ///
    /// 找到执行中的任务时触发其取消令牌并返回 `true`
    pub fn cancel_job(&self, job_id: Uuid) -> bool {
        self.registry.cancel(job_id)
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }
}
