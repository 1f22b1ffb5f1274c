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

use spydr::application::dto::crawl_job_request::CreateCrawlJobRequest;
use spydr::application::use_cases::crawl_job_use_case::CrawlJobService;
use spydr::config::settings::Settings;
use spydr::domain::repositories::crawl_job_repository::CrawlJobRepository;
use spydr::domain::repositories::storage_repository::StorageRepository;
use spydr::domain::services::crawl_service::{CrawlService, Crawler};
use spydr::domain::services::screenshot_service::ScreenshotService;
use spydr::engines::chromium_engine::ChromiumScreenshotEngine;
use spydr::engines::reqwest_engine::ReqwestEngine;
use spydr::infrastructure::database::connection;
use spydr::infrastructure::metrics::init_metrics;
use spydr::infrastructure::repositories::crawl_job_repo_impl::CrawlJobRepositoryImpl;
use spydr::infrastructure::storage::create_storage_repository;
use spydr::utils::telemetry;
use spydr::workers::{CancellationRegistry, WorkerPool};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// 主函数
///
/// 初始化所有组件并启动工作池；命令行参数中的URL会被入队
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting spydr...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    init_metrics(&settings.metrics);

    // 3. Connect to database and apply migrations
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    connection::run_migrations(db.as_ref()).await?;

    let repository: Arc<dyn CrawlJobRepository> = Arc::new(CrawlJobRepositoryImpl::new(db));
    let storage: Arc<dyn StorageRepository> =
        Arc::from(create_storage_repository(&settings.storage)?);

    // 4. Build the crawl pipeline
    let http = Arc::new(ReqwestEngine::new(&settings.crawler)?);
    let mut crawl_service = CrawlService::new(http.clone(), http, &settings.crawler);
    if settings.screenshot.enabled {
        let engine = Arc::new(ChromiumScreenshotEngine::new(&settings.screenshot));
        crawl_service = crawl_service.with_screenshots(ScreenshotService::new(
            engine,
            storage.clone(),
            settings.screenshot.fail_crawl_on_error,
        ));
    } else {
        info!("Screenshots disabled");
    }
    let crawler: Arc<dyn Crawler> = Arc::new(crawl_service);

    // 5. Start the worker pool
    let registry = CancellationRegistry::new();
    let mut pool = WorkerPool::new(
        repository.clone(),
        crawler,
        registry.clone(),
        settings.worker.clone(),
    )?;
    pool.start();

    // 6. Enqueue any URLs given on the command line
    let jobs = CrawlJobService::new(repository, registry, storage);
    for url in std::env::args().skip(1) {
        match jobs.enqueue(CreateCrawlJobRequest::new(url.as_str())).await {
            Ok(job) => info!(job_id = %job.id, "Queued {}", job.url),
            Err(e) => warn!("Skipping {}: {}", url, e),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }

    pool.stop().await;
    Ok(())
}
