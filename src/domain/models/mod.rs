// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 爬取任务（crawl_job）：持久化的任务记录及其状态机
/// - 爬取结果（crawl_result）：一次管道执行产生的提取数据
pub mod crawl_job;
pub mod crawl_result;
