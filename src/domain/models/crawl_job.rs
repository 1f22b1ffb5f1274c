// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_result::{CrawlResult, HeadingCounts};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 被取消任务的固定提示信息
pub const CANCELLED_MESSAGE: &str = "Job was cancelled";

/// 爬取任务实体
///
/// 表示一次针对单个网页的爬取请求及其提取结果。任务由调用方以
/// `queued` 状态创建，由工作池认领执行，最终停留在
/// `done`、`error` 或 `canceled` 之一。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJob {
    /// 任务唯一标识符（UUID v7，按创建时间有序）
    pub id: Uuid,
    /// 目标URL
    pub url: String,
    /// 页面标题
    pub title: Option<String>,
    /// 文档版本标签
    pub html_version: Option<String>,
    /// 标题层级统计
    #[serde(flatten)]
    pub headings: HeadingCounts,
    /// 内部链接数量
    pub internal_links: i32,
    /// 外部链接数量
    pub external_links: i32,
    /// 无法访问的链接数量
    pub inaccessible_links: i32,
    /// 是否包含登录表单
    pub has_login_form: bool,
    /// 截图文件名
    pub screenshot_path: Option<String>,
    /// 任务状态
    pub status: JobStatus,
    /// 错误信息（失败或取消时填写）
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
    /// 软删除标记
    #[serde(skip)]
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// queued → running → done/error/canceled，或 queued → canceled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已入队，等待工作器认领
    #[default]
    Queued,
    /// 正在执行爬取管道
    Running,
    /// 成功完成
    Done,
    /// 爬取失败
    Error,
    /// 已取消
    Canceled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "done" => Ok(JobStatus::Done),
            "error" => Ok(JobStatus::Error),
            "canceled" => Ok(JobStatus::Canceled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: JobStatus, to: JobStatus },

    /// 无法识别的状态标签
    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
}

/// 一次执行的最终结果分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// 管道成功返回
    Done(CrawlResult),
    /// 管道返回错误，携带原始错误文本
    Failed(String),
    /// 执行上下文被取消
    Canceled,
}

impl CrawlJob {
    /// 创建一个新的排队任务
    pub fn new(url: impl Into<String>) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::now_v7(),
            url: url.into(),
            title: None,
            html_version: None,
            headings: HeadingCounts::default(),
            internal_links: 0,
            external_links: 0,
            inaccessible_links: 0,
            has_login_form: false,
            screenshot_path: None,
            status: JobStatus::Queued,
            error_message: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Canceled)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Error)
                | (JobStatus::Running, JobStatus::Canceled)
        );
        if !allowed {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now().into();
        Ok(())
    }

    /// 启动任务：queued → running
    pub fn start(mut self) -> Result<Self, DomainError> {
        self.transition(JobStatus::Running)?;
        Ok(self)
    }

    /// 完成任务并复制提取字段：running → done
    pub fn complete(mut self, result: CrawlResult) -> Result<Self, DomainError> {
        self.transition(JobStatus::Done)?;
        self.title = result.title;
        self.headings = result.headings;
        self.internal_links = result.internal_links;
        self.external_links = result.external_links;
        self.inaccessible_links = result.broken_links;
        self.has_login_form = result.has_login_form;
        self.html_version = Some(result.html_version);
        self.screenshot_path = result.screenshot_path;
        self.error_message = None;
        Ok(self)
    }

    /// 标记任务失败：running → error
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        self.transition(JobStatus::Error)?;
        self.error_message = Some(message.into());
        Ok(self)
    }

    /// 取消任务：queued/running → canceled
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        self.transition(JobStatus::Canceled)?;
        self.error_message = Some(CANCELLED_MESSAGE.to_string());
        Ok(self)
    }

    /// 按分类结果结束一次执行
    pub fn finish(self, outcome: CrawlOutcome) -> Result<Self, DomainError> {
        match outcome {
            CrawlOutcome::Done(result) => self.complete(result),
            CrawlOutcome::Failed(message) => self.fail(message),
            CrawlOutcome::Canceled => self.cancel(),
        }
    }
}
