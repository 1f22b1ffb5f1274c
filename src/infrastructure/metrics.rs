// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 启用时在配置的地址上安装 Prometheus 导出器，并注册工作池使用的指标。
/// 未启用时指标宏调用为空操作。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "spydr_jobs_claimed_total",
        "Total number of crawl jobs claimed by workers"
    );
    describe_counter!(
        "spydr_jobs_finished_total",
        "Total number of crawl jobs that reached a terminal status"
    );
    describe_counter!(
        "spydr_claim_anomalies_total",
        "Claim updates that touched more than one row"
    );
    describe_counter!(
        "spydr_job_persist_failures_total",
        "Terminal job states that could not be persisted"
    );
    describe_histogram!(
        "spydr_job_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of a crawl job from claim to persistence"
    );
}
