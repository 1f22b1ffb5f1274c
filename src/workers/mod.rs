// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 包括爬取工作器、工作池生命周期管理和运行中任务的取消注册表
pub mod cancellation;
pub mod crawl_worker;
pub mod manager;
pub mod worker;

pub use cancellation::CancellationRegistry;
pub use manager::WorkerPool;
pub use worker::Worker;
