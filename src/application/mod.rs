// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 提供与传输层无关的任务操作：入队、查询、停止、删除和读取截图
pub mod dto;
pub mod use_cases;
