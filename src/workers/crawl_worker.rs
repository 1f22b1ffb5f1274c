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

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinError;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::domain::models::crawl_job::{CrawlJob, CrawlOutcome};
use crate::domain::models::crawl_result::CrawlResult;
use crate::domain::repositories::crawl_job_repository::CrawlJobRepository;
use crate::domain::services::crawl_service::{CrawlError, Crawler};
use crate::utils::errors::WorkerError;
use crate::workers::cancellation::CancellationRegistry;
use crate::workers::worker::Worker;

type PipelineJoin = Result<Result<CrawlResult, CrawlError>, JoinError>;

/// 按优先级归类一次执行的结果
///
/// 取消优先于管道返回的任何结果或错误；`joined` 为 `None`
/// 表示管道在完成前被中止
fn classify_outcome(cancelled: bool, joined: Option<PipelineJoin>) -> CrawlOutcome {
    match joined {
        _ if cancelled => CrawlOutcome::Canceled,
        None => CrawlOutcome::Canceled,
        Some(Ok(Ok(result))) => CrawlOutcome::Done(result),
        Some(Ok(Err(CrawlError::Cancelled))) => CrawlOutcome::Canceled,
        Some(Ok(Err(e))) => CrawlOutcome::Failed(e.to_string()),
        Some(Err(e)) => CrawlOutcome::Failed(format!("crawl task failed: {}", e)),
    }
}

/// 爬取工作器
///
/// 循环认领排队任务并执行爬取管道，直到收到工作池的停止信号。
/// 停止信号只在循环边界生效，正在执行的任务会完成并持久化。
pub struct CrawlWorker {
    id: usize,
    name: String,
    repository: Arc<dyn CrawlJobRepository>,
    crawler: Arc<dyn Crawler>,
    registry: CancellationRegistry,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl CrawlWorker {
    /// 创建新的爬取工作器实例
    pub fn new(
        id: usize,
        repository: Arc<dyn CrawlJobRepository>,
        crawler: Arc<dyn Crawler>,
        registry: CancellationRegistry,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            name: format!("crawl-worker-{}", id),
            repository,
            crawler,
            registry,
            poll_interval,
            shutdown,
        }
    }

    /// 尝试认领并处理一个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 处理了一个任务
    /// * `Ok(false)` - 当前没有可认领的任务
    pub async fn process_next(&self) -> Result<bool, WorkerError> {
        let Some(job) = self.repository.claim_next_queued().await? else {
            return Ok(false);
        };

        metrics::counter!("spydr_jobs_claimed_total").increment(1);
        self.dispatch(job).await?;
        Ok(true)
    }

    #[instrument(skip(self, job), fields(worker = self.id, job_id = %job.id, url = %job.url))]
    async fn dispatch(&self, job: CrawlJob) -> Result<(), WorkerError> {
        info!("Processing crawl job");
        let started = Instant::now();

        let token = CancellationToken::new();
        let guard = self.registry.register(job.id, token.clone());

        let crawler = self.crawler.clone();
        let url = job.url.clone();
        let pipeline_token = token.child_token();
        let mut pipeline =
            tokio::spawn(async move { crawler.crawl(&url, &pipeline_token).await });

        let joined = tokio::select! {
            biased;
            _ = token.cancelled() => {
                pipeline.abort();
                None
            }
            joined = &mut pipeline => Some(joined),
        };
        let outcome = classify_outcome(token.is_cancelled(), joined);
        drop(guard);

        let job = job.finish(outcome)?;
        let status = job.status.to_string();

        metrics::counter!("spydr_jobs_finished_total", "status" => status.clone()).increment(1);
        metrics::histogram!("spydr_job_duration_seconds").record(started.elapsed().as_secs_f64());

        match self.repository.save(&job).await {
            Ok(_) => info!(status = %status, "Crawl job finished"),
            Err(e) => {
                metrics::counter!("spydr_job_persist_failures_total").increment(1);
                error!(status = %status, "Failed to persist crawl job: {}", e);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Worker for CrawlWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!(worker = self.id, "Crawl worker started");

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let idle = match self.process_next().await {
                Ok(processed) => !processed,
                Err(e) => {
                    error!(worker = self.id, "Error processing crawl job: {}", e);
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = sleep(self.poll_interval) => {}
                }
            }
        }

        debug!(worker = self.id, "Crawl worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
