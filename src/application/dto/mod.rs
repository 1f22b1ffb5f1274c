// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据传输对象模块
///
/// 在调用方请求和领域模型之间传输数据
pub mod crawl_job_request;
