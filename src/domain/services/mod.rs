// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 爬取服务（crawl_service）：串联整个爬取管道
/// - 页面分析（page_analyzer）：标题、标题层级、登录表单与链接提取
/// - 链接分析（link_analyzer）：链接归属与可用性统计
/// - 文档版本（html_version）：根据 DOCTYPE 识别文档版本
/// - 截图服务（screenshot_service）：截图并写入存储
pub mod crawl_service;
pub mod html_version;
pub mod link_analyzer;
pub mod page_analyzer;
pub mod screenshot_service;
