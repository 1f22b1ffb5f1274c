// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use spydr::config::settings::WorkerSettings;
use spydr::domain::models::crawl_job::{CrawlJob, JobStatus};
use spydr::domain::repositories::crawl_job_repository::CrawlJobRepository;
use spydr::engines::traits::{EngineError, ScreenshotEngine};
use spydr::infrastructure::repositories::crawl_job_repo_impl::CrawlJobRepositoryImpl;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

/// 创建已迁移的内存SQLite数据库
///
/// 内存数据库只存在于单个连接中，因此连接池大小固定为1
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("in-memory sqlite should connect");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    Arc::new(db)
}

pub async fn setup_repo() -> Arc<CrawlJobRepositoryImpl> {
    Arc::new(CrawlJobRepositoryImpl::new(setup_db().await))
}

/// 在临时目录中创建基于文件的SQLite数据库
///
/// 多个连接可以同时开启事务，用于验证并发认领
pub async fn setup_file_repo(dir: &TempDir, connections: u32) -> Arc<CrawlJobRepositoryImpl> {
    let path = dir.path().join("spydr.db");
    let mut opt = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    opt.max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("file sqlite should connect");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    Arc::new(CrawlJobRepositoryImpl::new(Arc::new(db)))
}

/// 工作池测试使用的快速轮询配置
pub fn fast_worker_settings(count: usize) -> WorkerSettings {
    WorkerSettings {
        count,
        poll_interval_ms: 20,
    }
}

/// 轮询直到条件满足或超时
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// 等待任务进入指定状态并返回最新记录
pub async fn wait_for_status(
    repo: &dyn CrawlJobRepository,
    id: Uuid,
    status: JobStatus,
) -> CrawlJob {
    let reached = wait_until(Duration::from_secs(10), || async move {
        matches!(repo.find_by_id(id).await, Ok(Some(job)) if job.status == status)
    })
    .await;
    assert!(reached, "job {id} never reached status {status}");

    repo.find_by_id(id)
        .await
        .expect("repository read")
        .expect("job exists")
}

/// 返回固定PNG字节的截图引擎
pub struct StubScreenshotEngine;

#[async_trait]
impl ScreenshotEngine for StubScreenshotEngine {
    async fn capture(&self, _url: &str) -> Result<Vec<u8>, EngineError> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
