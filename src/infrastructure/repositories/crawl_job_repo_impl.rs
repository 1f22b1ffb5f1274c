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

use crate::domain::models::crawl_job::{CrawlJob, JobStatus, CANCELLED_MESSAGE};
use crate::domain::models::crawl_result::HeadingCounts;
use crate::domain::repositories::crawl_job_repository::{
    CrawlJobQuery, CrawlJobRepository, RepositoryError, SortField, SortOrder,
};
use crate::infrastructure::database::entities::crawl_job as crawl_job_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    sqlx, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DbBackend, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RuntimeErr, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 爬取任务仓库实现
///
/// 基于SeaORM实现，认领操作依赖行锁加 `SKIP LOCKED`
/// 以及带状态条件的更新来保证同一任务只被认领一次
#[derive(Clone)]
pub struct CrawlJobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl CrawlJobRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn not_deleted() -> Condition {
        Condition::all().add(crawl_job_entity::Column::DeletedAt.is_null())
    }

    async fn try_claim(&self) -> Result<Option<CrawlJob>, RepositoryError> {
        let txn = self.db.begin().await?;

        let candidate = crawl_job_entity::Entity::find()
            .filter(crawl_job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
            .filter(Self::not_deleted())
            .order_by_asc(crawl_job_entity::Column::CreatedAt)
            .order_by_asc(crawl_job_entity::Column::Id)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let Some(candidate) = candidate else {
            txn.commit().await?;
            return Ok(None);
        };

        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = crawl_job_entity::Entity::update_many()
            .col_expr(
                crawl_job_entity::Column::Status,
                Expr::value(JobStatus::Running.to_string()),
            )
            .col_expr(crawl_job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(crawl_job_entity::Column::Id.eq(candidate.id))
            .filter(crawl_job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
            .exec(&txn)
            .await?;

        match result.rows_affected {
            1 => {
                txn.commit().await?;
                let mut job: CrawlJob = candidate.into();
                job.status = JobStatus::Running;
                job.updated_at = now;
                Ok(Some(job))
            }
            0 => {
                // Lost the race to another claimer, retried on the next tick
                txn.rollback().await?;
                Ok(None)
            }
            n => {
                txn.rollback().await?;
                warn!(
                    job_id = %candidate.id,
                    rows_affected = n,
                    "Claim update touched more than one row, rolled back"
                );
                metrics::counter!("spydr_claim_anomalies_total").increment(1);
                Ok(None)
            }
        }
    }
}

/// SQLite 写锁竞争：SQLITE_BUSY(5) 或 SQLITE_LOCKED(6)，含其扩展码
fn is_sqlite_lock_contention(err: &DbErr) -> bool {
    let (DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return false;
    };

    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}

impl From<crawl_job_entity::Model> for CrawlJob {
    fn from(model: crawl_job_entity::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            title: model.title,
            html_version: model.html_version,
            headings: HeadingCounts {
                h1: model.h1,
                h2: model.h2,
                h3: model.h3,
                h4: model.h4,
                h5: model.h5,
                h6: model.h6,
            },
            internal_links: model.internal_links,
            external_links: model.external_links,
            inaccessible_links: model.inaccessible_links,
            has_login_form: model.has_login_form,
            screenshot_path: model.screenshot_path,
            status: model.status.parse().unwrap_or_else(|e| {
                warn!(job_id = %model.id, "{}, reading row as error", e);
                JobStatus::Error
            }),
            error_message: model.error_message,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        }
    }
}

impl From<CrawlJob> for crawl_job_entity::ActiveModel {
    fn from(job: CrawlJob) -> Self {
        Self {
            id: Set(job.id),
            url: Set(job.url),
            status: Set(job.status.to_string()),
            title: Set(job.title),
            html_version: Set(job.html_version),
            h1: Set(job.headings.h1),
            h2: Set(job.headings.h2),
            h3: Set(job.headings.h3),
            h4: Set(job.headings.h4),
            h5: Set(job.headings.h5),
            h6: Set(job.headings.h6),
            internal_links: Set(job.internal_links),
            external_links: Set(job.external_links),
            inaccessible_links: Set(job.inaccessible_links),
            has_login_form: Set(job.has_login_form),
            screenshot_path: Set(job.screenshot_path),
            error_message: Set(job.error_message),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
            deleted_at: Set(job.deleted_at),
        }
    }
}

fn sort_column(field: SortField) -> crawl_job_entity::Column {
    match field {
        SortField::Title => crawl_job_entity::Column::Title,
        SortField::Status => crawl_job_entity::Column::Status,
        SortField::UpdatedAt => crawl_job_entity::Column::UpdatedAt,
        SortField::HtmlVersion => crawl_job_entity::Column::HtmlVersion,
        SortField::CreatedAt => crawl_job_entity::Column::CreatedAt,
        SortField::Url => crawl_job_entity::Column::Url,
    }
}

#[async_trait]
impl CrawlJobRepository for CrawlJobRepositoryImpl {
    async fn create(&self, job: &CrawlJob) -> Result<CrawlJob, RepositoryError> {
        let model: crawl_job_entity::ActiveModel = job.clone().into();

        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlJob>, RepositoryError> {
        let model = crawl_job_entity::Entity::find_by_id(id)
            .filter(Self::not_deleted())
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn claim_next_queued(&self) -> Result<Option<CrawlJob>, RepositoryError> {
        match self.try_claim().await {
            // SQLite has no row locks: a competing claimer shows up as a busy database
            Err(RepositoryError::Database(e))
                if self.db.get_database_backend() == DbBackend::Sqlite
                    && is_sqlite_lock_contention(&e) =>
            {
                debug!("Claim contended on a locked database, retrying next tick: {}", e);
                Ok(None)
            }
            other => other,
        }
    }

    async fn save(&self, job: &CrawlJob) -> Result<CrawlJob, RepositoryError> {
        let mut model: crawl_job_entity::ActiveModel = job.clone().into();
        model.updated_at = Set(Utc::now().into());

        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn cancel_if_queued(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = crawl_job_entity::Entity::update_many()
            .col_expr(
                crawl_job_entity::Column::Status,
                Expr::value(JobStatus::Canceled.to_string()),
            )
            .col_expr(
                crawl_job_entity::Column::ErrorMessage,
                Expr::value(Some(CANCELLED_MESSAGE.to_string())),
            )
            .col_expr(crawl_job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(crawl_job_entity::Column::Id.eq(id))
            .filter(crawl_job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
            .filter(Self::not_deleted())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn query(&self, query: CrawlJobQuery) -> Result<(Vec<CrawlJob>, u64), RepositoryError> {
        let mut select = crawl_job_entity::Entity::find().filter(Self::not_deleted());

        if let Some(status) = query.status {
            select = select.filter(crawl_job_entity::Column::Status.eq(status.to_string()));
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(crawl_job_entity::Column::Title.contains(search))
                    .add(crawl_job_entity::Column::Url.contains(search))
                    .add(crawl_job_entity::Column::HtmlVersion.contains(search))
                    .add(crawl_job_entity::Column::Status.contains(search)),
            );
        }

        let total = select.clone().count(self.db.as_ref()).await?;

        let order = match query.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let models = select
            .order_by(sort_column(query.sort_by), order)
            .limit(query.limit)
            .offset(query.offset)
            .all(self.db.as_ref())
            .await?;

        Ok((models.into_iter().map(CrawlJob::from).collect(), total))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = crawl_job_entity::Entity::update_many()
            .col_expr(crawl_job_entity::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(crawl_job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(crawl_job_entity::Column::Id.eq(id))
            .filter(Self::not_deleted())
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
