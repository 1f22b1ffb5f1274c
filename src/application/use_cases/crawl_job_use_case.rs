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

use crate::{
    application::dto::crawl_job_request::{
        CrawlJobListQuery, CreateCrawlJobRequest, PaginatedCrawlJobs,
    },
    domain::{
        models::crawl_job::{CrawlJob, JobStatus},
        repositories::{
            crawl_job_repository::{CrawlJobQuery, CrawlJobRepository, RepositoryError},
            storage_repository::{StorageError, StorageRepository},
        },
    },
    workers::cancellation::CancellationRegistry,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum CrawlJobError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Job not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// 停止请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// 通过取消令牌中断了执行中的任务
    RunningCancelled,
    /// 排队中的任务被直接置为 canceled
    QueuedCancelled,
}

impl StopOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            StopOutcome::RunningCancelled => "Running job cancelled",
            StopOutcome::QueuedCancelled => "Queued job cancelled",
        }
    }
}

/// 爬取任务服务
///
/// 面向调用方的任务操作，供任意传输层复用
pub struct CrawlJobService {
    repository: Arc<dyn CrawlJobRepository>,
    registry: CancellationRegistry,
    storage: Arc<dyn StorageRepository>,
}

impl CrawlJobService {
    pub fn new(
        repository: Arc<dyn CrawlJobRepository>,
        registry: CancellationRegistry,
        storage: Arc<dyn StorageRepository>,
    ) -> Self {
        Self {
            repository,
            registry,
            storage,
        }
    }

    /// 校验URL并创建排队任务
    pub async fn enqueue(&self, request: CreateCrawlJobRequest) -> Result<CrawlJob, CrawlJobError> {
        request
            .validate()
            .map_err(|e| CrawlJobError::Validation(e.to_string()))?;

        let job = self.repository.create(&CrawlJob::new(request.url)).await?;
        info!(job_id = %job.id, url = %job.url, "Crawl job enqueued");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<CrawlJob, CrawlJobError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CrawlJobError::NotFound)
    }

    pub async fn list(&self, query: CrawlJobListQuery) -> Result<PaginatedCrawlJobs, CrawlJobError> {
        let query =
            CrawlJobQuery::try_from(query).map_err(|e| CrawlJobError::Validation(e.to_string()))?;
        let (limit, offset) = (query.limit, query.offset);

        let (data, total) = self.repository.query(query).await?;
        Ok(PaginatedCrawlJobs {
            data,
            total,
            limit,
            offset,
        })
    }

    /// 停止任务
    ///
    /// 执行中的任务通过取消注册表中断；排队中的任务用带状态条件的更新取消。
    /// 如果任务在读取之后、条件更新之前被认领，则再通过注册表尝试一次。
    pub async fn stop(&self, id: Uuid) -> Result<StopOutcome, CrawlJobError> {
        let job = self.get(id).await?;

        let stopped = match job.status {
            JobStatus::Running if self.registry.cancel(id) => Some(StopOutcome::RunningCancelled),
            JobStatus::Queued => {
                if self.repository.cancel_if_queued(id).await? {
                    Some(StopOutcome::QueuedCancelled)
                } else if self.registry.cancel(id) {
                    Some(StopOutcome::RunningCancelled)
                } else {
                    None
                }
            }
            _ => None,
        };

        match stopped {
            Some(outcome) => {
                info!(job_id = %id, "{}", outcome.message());
                Ok(outcome)
            }
            None => Err(CrawlJobError::Conflict("Job cannot be stopped".to_string())),
        }
    }

    /// 软删除任务，执行中的任务需先停止
    pub async fn delete(&self, id: Uuid) -> Result<(), CrawlJobError> {
        let job = self.get(id).await?;

        if job.status == JobStatus::Running {
            return Err(CrawlJobError::Conflict(
                "Cannot delete running job. Stop it first.".to_string(),
            ));
        }

        match self.repository.soft_delete(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(CrawlJobError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取任务截图的PNG字节
    pub async fn screenshot(&self, id: Uuid) -> Result<Vec<u8>, CrawlJobError> {
        let job = self.get(id).await?;
        let name = job.screenshot_path.ok_or(CrawlJobError::NotFound)?;

        self.storage
            .get(&name)
            .await?
            .ok_or(CrawlJobError::NotFound)
    }
}
