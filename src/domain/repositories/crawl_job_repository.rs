// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::{CrawlJob, JobStatus};
use async_trait::async_trait;
use sea_orm::DbErr;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 列表排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Title,
    Status,
    UpdatedAt,
    HtmlVersion,
    #[default]
    CreatedAt,
    Url,
}

impl FromStr for SortField {
    type Err = std::convert::Infallible;

    /// 未知字段回退到 `createdAt`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "title" => SortField::Title,
            "status" => SortField::Status,
            "updatedAt" => SortField::UpdatedAt,
            "htmlVersion" => SortField::HtmlVersion,
            "url" => SortField::Url,
            _ => SortField::CreatedAt,
        })
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        })
    }
}

/// 任务查询参数
#[derive(Debug, Clone)]
pub struct CrawlJobQuery {
    /// 按状态过滤
    pub status: Option<JobStatus>,
    /// 在标题、URL、文档版本和状态上做子串匹配
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: u64,
    pub offset: u64,
}

impl Default for CrawlJobQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            limit: 50,
            offset: 0,
        }
    }
}

/// 爬取任务仓库特质
///
/// 所有读取操作都会忽略已软删除的记录
#[async_trait]
pub trait CrawlJobRepository: Send + Sync {
    /// 插入新任务
    async fn create(&self, job: &CrawlJob) -> Result<CrawlJob, RepositoryError>;

    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlJob>, RepositoryError>;

    /// 认领最早的排队任务并将其置为 running
    ///
    /// 并发调用时同一任务只会被一个调用方认领；
    /// 没有可认领任务或竞争失败时返回 `None`
    async fn claim_next_queued(&self) -> Result<Option<CrawlJob>, RepositoryError>;

    /// 保存任务的完整字段
    async fn save(&self, job: &CrawlJob) -> Result<CrawlJob, RepositoryError>;

    /// 仅当任务仍为 queued 时将其置为 canceled，返回是否生效
    async fn cancel_if_queued(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// 分页查询任务，返回当前页与总数
    async fn query(&self, query: CrawlJobQuery) -> Result<(Vec<CrawlJob>, u64), RepositoryError>;

    /// 软删除任务
    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
