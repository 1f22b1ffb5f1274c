// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 标题层级统计（h1 - h6）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCounts {
    pub h1: i32,
    pub h2: i32,
    pub h3: i32,
    pub h4: i32,
    pub h5: i32,
    pub h6: i32,
}

impl HeadingCounts {
    /// 按标签名累加，非标题标签返回false
    pub fn record(&mut self, tag: &str) -> bool {
        let slot = match tag {
            "h1" => &mut self.h1,
            "h2" => &mut self.h2,
            "h3" => &mut self.h3,
            "h4" => &mut self.h4,
            "h5" => &mut self.h5,
            "h6" => &mut self.h6,
            _ => return false,
        };
        *slot += 1;
        true
    }
}

/// 爬取结果
///
/// 由爬取管道产生一次、由工作池消费一次的临时值，
/// 其字段被复制到对应的 `CrawlJob` 后即被丢弃，从不单独持久化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlResult {
    /// 第一个 `<title>` 元素的文本
    pub title: Option<String>,
    /// 标题层级统计
    pub headings: HeadingCounts,
    /// 内部链接数量
    pub internal_links: i32,
    /// 外部链接数量
    pub external_links: i32,
    /// 无法访问的链接数量
    pub broken_links: i32,
    /// 页面是否包含登录表单
    pub has_login_form: bool,
    /// 文档版本标签，例如 "HTML5"
    pub html_version: String,
    /// 截图文件名
    pub screenshot_path: Option<String>,
}
