// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    fast_worker_settings, setup_repo, wait_for_status, wait_until, StubScreenshotEngine,
};
use async_trait::async_trait;
use spydr::application::dto::crawl_job_request::CreateCrawlJobRequest;
use spydr::application::use_cases::crawl_job_use_case::{CrawlJobService, StopOutcome};
use spydr::config::settings::CrawlerSettings;
use spydr::domain::models::crawl_job::{JobStatus, CANCELLED_MESSAGE};
use spydr::domain::models::crawl_result::CrawlResult;
use spydr::domain::repositories::crawl_job_repository::CrawlJobRepository;
use spydr::domain::services::crawl_service::{CrawlError, CrawlService, Crawler};
use spydr::domain::services::screenshot_service::ScreenshotService;
use spydr::engines::reqwest_engine::ReqwestEngine;
use spydr::infrastructure::storage::InMemoryStorage;
use spydr::workers::{CancellationRegistry, WorkerPool};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 一直阻塞到被取消的爬取管道
struct HangingCrawler;

#[async_trait]
impl Crawler for HangingCrawler {
    async fn crawl(
        &self,
        _url: &str,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        cancel.cancelled().await;
        Err(CrawlError::Cancelled)
    }
}

/// 忽略取消令牌、延迟后返回完整结果的爬取管道
struct StubbornCrawler {
    delay: Duration,
}

#[async_trait]
impl Crawler for StubbornCrawler {
    async fn crawl(
        &self,
        _url: &str,
        _cancel: &CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        tokio::time::sleep(self.delay).await;
        Ok(CrawlResult {
            title: Some("Late result".to_string()),
            internal_links: 5,
            external_links: 2,
            has_login_form: true,
            html_version: "HTML5".to_string(),
            ..Default::default()
        })
    }
}

fn crawler_settings() -> CrawlerSettings {
    CrawlerSettings {
        fetch_timeout_secs: 5,
        link_check_timeout_secs: 2,
        ..Default::default()
    }
}

/// 测试排队任务在没有工作器时被直接取消
#[tokio::test]
async fn test_stop_queued_job_without_workers() {
    let repo = setup_repo().await;
    let service = CrawlJobService::new(
        repo.clone(),
        CancellationRegistry::new(),
        Arc::new(InMemoryStorage::new()),
    );

    let job = service
        .enqueue(CreateCrawlJobRequest::new("https://example.com"))
        .await
        .unwrap();

    let outcome = service.stop(job.id).await.unwrap();
    assert_eq!(outcome, StopOutcome::QueuedCancelled);

    let stored = service.get(job.id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Canceled);
    assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));
}

/// 测试通过注册表取消执行中的任务
#[tokio::test]
async fn test_stop_running_job_cancels_pipeline() {
    let repo = setup_repo().await;
    let registry = CancellationRegistry::new();
    let service = CrawlJobService::new(
        repo.clone(),
        registry.clone(),
        Arc::new(InMemoryStorage::new()),
    );

    let mut pool = WorkerPool::new(
        repo.clone(),
        Arc::new(HangingCrawler),
        registry.clone(),
        fast_worker_settings(1),
    )
    .unwrap();
    pool.start();

    let job = service
        .enqueue(CreateCrawlJobRequest::new("https://example.com/slow"))
        .await
        .unwrap();

    let watched = &registry;
    let active = wait_until(Duration::from_secs(5), || async move {
        watched.is_active(job.id)
    })
    .await;
    assert!(active, "job was never picked up");
    assert_eq!(
        service.get(job.id).await.unwrap().status,
        JobStatus::Running
    );

    let outcome = service.stop(job.id).await.unwrap();
    assert_eq!(outcome, StopOutcome::RunningCancelled);

    let stored = wait_for_status(repo.as_ref(), job.id, JobStatus::Canceled).await;
    assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    assert!(!registry.is_active(job.id));

    pool.stop().await;
    assert!(!pool.is_running());
}

/// 测试取消优先于管道稍后返回的结果
#[tokio::test]
async fn test_cancellation_discards_late_pipeline_result() {
    let repo = setup_repo().await;
    let registry = CancellationRegistry::new();
    let service = CrawlJobService::new(
        repo.clone(),
        registry.clone(),
        Arc::new(InMemoryStorage::new()),
    );

    let mut pool = WorkerPool::new(
        repo.clone(),
        Arc::new(StubbornCrawler {
            delay: Duration::from_millis(500),
        }),
        registry.clone(),
        fast_worker_settings(1),
    )
    .unwrap();
    pool.start();

    let job = service
        .enqueue(CreateCrawlJobRequest::new("https://example.com/late"))
        .await
        .unwrap();

    let watched = &registry;
    let active = wait_until(Duration::from_secs(5), || async move {
        watched.is_active(job.id)
    })
    .await;
    assert!(active, "job was never picked up");

    assert_eq!(
        service.stop(job.id).await.unwrap(),
        StopOutcome::RunningCancelled
    );

    let stored = wait_for_status(repo.as_ref(), job.id, JobStatus::Canceled).await;
    assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    assert!(stored.title.is_none());
    assert_eq!(stored.internal_links, 0);
    assert_eq!(stored.external_links, 0);
    assert!(!stored.has_login_form);
    assert!(stored.html_version.is_none());

    // 管道原本完成的时间过后状态保持不变
    tokio::time::sleep(Duration::from_millis(600)).await;
    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Canceled);
    assert!(stored.title.is_none());

    pool.stop().await;
}

/// 测试完整的爬取流程：抓取、提取、链接检查、文档版本与截图
#[tokio::test]
async fn test_worker_pool_crawls_page_end_to_end() {
    let server = MockServer::start().await;
    let body = r#"<!DOCTYPE html>
<html>
  <head><title>Sign in</title></head>
  <body>
    <h1>Welcome</h1>
    <h2>Account</h2>
    <form action="/login" method="post">
      <input type="text" name="user">
      <input type="password" name="pass">
    </form>
    <a href="/missing">Missing page</a>
    <a href="mailto:team@example.com">Mail</a>
  </body>
</html>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let repo = setup_repo().await;
    let registry = CancellationRegistry::new();
    let storage = Arc::new(InMemoryStorage::new());

    let engine = Arc::new(ReqwestEngine::new(&crawler_settings()).unwrap());
    let screenshots = ScreenshotService::new(Arc::new(StubScreenshotEngine), storage.clone(), true);
    let crawler = CrawlService::new(engine.clone(), engine, &crawler_settings())
        .with_screenshots(screenshots);

    let service = CrawlJobService::new(repo.clone(), registry.clone(), storage.clone());
    let mut pool = WorkerPool::new(
        repo.clone(),
        Arc::new(crawler),
        registry,
        fast_worker_settings(2),
    )
    .unwrap();
    pool.start();

    let job = service
        .enqueue(CreateCrawlJobRequest::new(format!("{}/", server.uri())))
        .await
        .unwrap();

    let done = wait_for_status(repo.as_ref(), job.id, JobStatus::Done).await;
    assert_eq!(done.title.as_deref(), Some("Sign in"));
    assert_eq!(done.headings.h1, 1);
    assert_eq!(done.headings.h2, 1);
    assert!(done.has_login_form);
    assert_eq!(done.internal_links, 1);
    assert_eq!(done.external_links, 0);
    assert_eq!(done.inaccessible_links, 1);
    assert_eq!(done.html_version.as_deref(), Some("HTML5"));
    assert!(done.error_message.is_none());

    let name = done.screenshot_path.clone().unwrap();
    assert!(name.ends_with(".png"));
    assert_eq!(storage.len(), 1);

    let png = service.screenshot(job.id).await.unwrap();
    assert!(png.starts_with(b"\x89PNG"));

    pool.stop().await;
}

/// 测试抓取失败时任务进入 error 状态并记录原始错误
#[tokio::test]
async fn test_fetch_failure_marks_job_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let repo = setup_repo().await;
    let engine = Arc::new(ReqwestEngine::new(&crawler_settings()).unwrap());
    let crawler = CrawlService::new(engine.clone(), engine, &crawler_settings());

    let mut pool = WorkerPool::new(
        repo.clone(),
        Arc::new(crawler),
        CancellationRegistry::new(),
        fast_worker_settings(1),
    )
    .unwrap();
    pool.start();

    let job = repo
        .create(&spydr::domain::models::crawl_job::CrawlJob::new(format!(
            "{}/broken",
            server.uri()
        )))
        .await
        .unwrap();

    let failed = wait_for_status(repo.as_ref(), job.id, JobStatus::Error).await;
    assert_eq!(failed.error_message.as_deref(), Some("fetch status 500"));
    assert!(failed.title.is_none());

    pool.stop().await;
}

/// 测试工作器数量为0的配置被拒绝
#[tokio::test]
async fn test_pool_rejects_zero_workers() {
    let repo = setup_repo().await;
    let pool = WorkerPool::new(
        repo,
        Arc::new(HangingCrawler),
        CancellationRegistry::new(),
        fast_worker_settings(0),
    );
    assert!(pool.is_err());
}

/// 测试停止工作池后不再认领新任务
#[tokio::test]
async fn test_stopped_pool_leaves_jobs_queued() {
    let repo = setup_repo().await;
    let mut pool = WorkerPool::new(
        repo.clone(),
        Arc::new(HangingCrawler),
        CancellationRegistry::new(),
        fast_worker_settings(2),
    )
    .unwrap();
    pool.start();
    pool.stop().await;

    let job = repo
        .create(&spydr::domain::models::crawl_job::CrawlJob::new(
            "https://example.com",
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);
}
