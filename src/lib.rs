// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 面向调用方的任务操作和数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含爬取任务实体、仓库接口和爬取管道
pub mod domain;

/// 引擎模块
///
/// HTTP抓取、链接检查和浏览器截图的实现
pub mod engines;

/// 基础设施模块
///
/// 提供数据库、存储和指标等外部服务集成
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 工作池、爬取工作器和取消注册表
pub mod workers;
