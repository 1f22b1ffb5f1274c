// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::{setup_file_repo, setup_repo};
use spydr::domain::models::crawl_job::{CrawlJob, JobStatus, CANCELLED_MESSAGE};
use spydr::domain::models::crawl_result::CrawlResult;
use spydr::domain::repositories::crawl_job_repository::{
    CrawlJobQuery, CrawlJobRepository, RepositoryError, SortField, SortOrder,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn insert(repo: &dyn CrawlJobRepository, url: &str) -> CrawlJob {
    let job = repo.create(&CrawlJob::new(url)).await.unwrap();
    // created_at 精度有限，稍作间隔保证先后顺序
    tokio::time::sleep(Duration::from_millis(5)).await;
    job
}

/// 测试按创建时间认领最早的任务
#[tokio::test]
async fn test_claim_takes_oldest_queued_job() {
    let repo = setup_repo().await;
    let first = insert(repo.as_ref(), "https://example.com/1").await;
    let second = insert(repo.as_ref(), "https://example.com/2").await;

    let claimed = repo.claim_next_queued().await.unwrap().unwrap();
    assert_eq!(claimed.id, first.id);
    assert_eq!(claimed.status, JobStatus::Running);

    let stored = repo.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Running);

    let next = repo.claim_next_queued().await.unwrap().unwrap();
    assert_eq!(next.id, second.id);

    assert!(repo.claim_next_queued().await.unwrap().is_none());
}

/// 测试并发认领时同一任务只被认领一次
#[tokio::test]
async fn test_concurrent_claims_never_share_a_job() {
    let repo = setup_repo().await;
    let job = insert(repo.as_ref(), "https://example.com").await;

    let (a, b, c) = tokio::join!(
        repo.claim_next_queued(),
        repo.claim_next_queued(),
        repo.claim_next_queued()
    );

    let claimed: Vec<CrawlJob> = [a, b, c]
        .into_iter()
        .filter_map(|r| r.unwrap())
        .collect();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, job.id);
}

/// 测试多个连接同时认领同一任务：恰好一个成功，其余静默返回空
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_claims_on_shared_database() {
    let dir = TempDir::new().unwrap();
    let repo = setup_file_repo(&dir, 6).await;
    let job = repo.create(&CrawlJob::new("https://example.com")).await.unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.claim_next_queued().await })
        })
        .collect();

    let mut claimed = Vec::new();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok(), "claim returned an error: {:?}", result.err());
        claimed.extend(result.unwrap());
    }

    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, job.id);
    assert_eq!(
        repo.find_by_id(job.id).await.unwrap().unwrap().status,
        JobStatus::Running
    );
}

/// 测试多个认领者抢占一批任务时每个任务只被认领一次且不报错
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_claimers_drain_queue_without_errors() {
    const JOBS: usize = 30;

    let dir = TempDir::new().unwrap();
    let repo = setup_file_repo(&dir, 8).await;
    for i in 0..JOBS {
        repo.create(&CrawlJob::new(format!("https://example.com/{i}")))
            .await
            .unwrap();
    }

    let total = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let repo = repo.clone();
            let total = total.clone();
            tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..500 {
                    if total.load(Ordering::SeqCst) >= JOBS {
                        break;
                    }
                    match repo.claim_next_queued().await.unwrap() {
                        Some(job) => {
                            ids.push(job.id);
                            total.fetch_add(1, Ordering::SeqCst);
                        }
                        None => tokio::time::sleep(Duration::from_millis(5)).await,
                    }
                }
                ids
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }

    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(all.len(), JOBS);
    assert_eq!(unique.len(), JOBS);
    assert!(repo.claim_next_queued().await.unwrap().is_none());
}

/// 测试已删除或非排队任务不会被认领
#[tokio::test]
async fn test_claim_skips_deleted_and_canceled_jobs() {
    let repo = setup_repo().await;
    let deleted = insert(repo.as_ref(), "https://example.com/deleted").await;
    let canceled = insert(repo.as_ref(), "https://example.com/canceled").await;

    repo.soft_delete(deleted.id).await.unwrap();
    assert!(repo.cancel_if_queued(canceled.id).await.unwrap());

    assert!(repo.claim_next_queued().await.unwrap().is_none());
    assert!(repo.find_by_id(deleted.id).await.unwrap().is_none());
}

/// 测试只有排队中的任务可以被条件取消
#[tokio::test]
async fn test_cancel_if_queued_only_affects_queued_jobs() {
    let repo = setup_repo().await;
    let job = insert(repo.as_ref(), "https://example.com").await;

    assert!(repo.cancel_if_queued(job.id).await.unwrap());
    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Canceled);
    assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));

    // 已经取消的任务再次取消不生效
    assert!(!repo.cancel_if_queued(job.id).await.unwrap());

    let running = insert(repo.as_ref(), "https://example.com/running").await;
    repo.claim_next_queued().await.unwrap().unwrap();
    assert!(!repo.cancel_if_queued(running.id).await.unwrap());
}

/// 测试保存执行结果
#[tokio::test]
async fn test_save_persists_finished_job() {
    let repo = setup_repo().await;
    insert(repo.as_ref(), "https://example.com").await;
    let claimed = repo.claim_next_queued().await.unwrap().unwrap();

    let result = CrawlResult {
        title: Some("Example Domain".to_string()),
        internal_links: 2,
        external_links: 1,
        broken_links: 1,
        has_login_form: true,
        html_version: "HTML5".to_string(),
        ..Default::default()
    };
    let finished = claimed.complete(result).unwrap();
    repo.save(&finished).await.unwrap();

    let stored = repo.find_by_id(finished.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Done);
    assert_eq!(stored.title.as_deref(), Some("Example Domain"));
    assert_eq!(stored.internal_links, 2);
    assert_eq!(stored.inaccessible_links, 1);
    assert!(stored.has_login_form);
    assert_eq!(stored.html_version.as_deref(), Some("HTML5"));
}

/// 测试过滤、搜索、排序与分页
#[tokio::test]
async fn test_query_filters_sorts_and_pages() {
    let repo = setup_repo().await;
    let alpha = insert(repo.as_ref(), "https://alpha.example.com").await;
    let beta = insert(repo.as_ref(), "https://beta.example.com").await;
    let gamma = insert(repo.as_ref(), "https://gamma.test").await;
    assert!(repo.cancel_if_queued(gamma.id).await.unwrap());

    let (all, total) = repo.query(CrawlJobQuery::default()).await.unwrap();
    assert_eq!(total, 3);
    // 默认按创建时间倒序
    assert_eq!(all[0].id, gamma.id);
    assert_eq!(all[2].id, alpha.id);

    let (found, total) = repo
        .query(CrawlJobQuery {
            search: Some("example.com".to_string()),
            sort_by: SortField::Url,
            sort_order: SortOrder::Asc,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(found[0].id, alpha.id);
    assert_eq!(found[1].id, beta.id);

    let (canceled, total) = repo
        .query(CrawlJobQuery {
            status: Some(JobStatus::Canceled),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(canceled[0].id, gamma.id);

    let (page, total) = repo
        .query(CrawlJobQuery {
            sort_order: SortOrder::Asc,
            limit: 1,
            offset: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, beta.id);
}

/// 测试软删除后的记录从查询中消失
#[tokio::test]
async fn test_soft_delete_hides_job() {
    let repo = setup_repo().await;
    let job = insert(repo.as_ref(), "https://example.com").await;

    repo.soft_delete(job.id).await.unwrap();

    let (jobs, total) = repo.query(CrawlJobQuery::default()).await.unwrap();
    assert!(jobs.is_empty());
    assert_eq!(total, 0);

    assert!(matches!(
        repo.soft_delete(job.id).await,
        Err(RepositoryError::NotFound)
    ));
}
