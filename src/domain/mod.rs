// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：爬取任务与爬取结果
/// - 仓库接口（repositories）：任务持久化与截图存储的抽象接口
/// - 服务（services）：爬取管道及其各个分析步骤
///
/// 领域层不依赖于任何具体的数据库或浏览器实现。
pub mod models;
pub mod repositories;
pub mod services;
