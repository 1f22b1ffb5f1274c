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

use crate::domain::models::crawl_job::{CrawlJob, DomainError, JobStatus};
use crate::domain::repositories::crawl_job_repository::CrawlJobQuery;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 创建爬取任务请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateCrawlJobRequest {
    /// 要爬取的网页URL，必须是 http(s) 绝对地址
    #[validate(
        url(message = "url must be an absolute URL"),
        custom(function = "validate_http_scheme")
    )]
    pub url: String,
}

impl CreateCrawlJobRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
        }
    }
}

fn validate_http_scheme(url: &str) -> Result<(), ValidationError> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("scheme").with_message("url must use http or https".into()))
    }
}

/// 任务列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJobListQuery {
    /// 按状态过滤
    pub status: Option<String>,
    /// 在标题、URL、文档版本和状态上搜索
    pub search: Option<String>,
    /// 排序字段：title、status、updatedAt、htmlVersion、createdAt、url
    pub sort_by: Option<String>,
    /// 排序方向：asc 或 desc
    pub sort_order: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl TryFrom<CrawlJobListQuery> for CrawlJobQuery {
    type Error = DomainError;

    fn try_from(query: CrawlJobListQuery) -> Result<Self, Self::Error> {
        let defaults = CrawlJobQuery::default();

        let status = query
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<JobStatus>())
            .transpose()?;

        Ok(CrawlJobQuery {
            status,
            search: query.search.filter(|s| !s.is_empty()),
            sort_by: query
                .sort_by
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sort_by),
            sort_order: query
                .sort_order
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sort_order),
            limit: query.limit.unwrap_or(defaults.limit),
            offset: query.offset.unwrap_or(defaults.offset),
        })
    }
}

/// 分页的任务列表
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedCrawlJobs {
    pub data: Vec<CrawlJob>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
