// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_result::HeadingCounts;
use scraper::{ElementRef, Html};
use std::collections::VecDeque;

/// 从文档树中提取的页面信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub title: Option<String>,
    pub headings: HeadingCounts,
    pub has_login_form: bool,
}

/// 单次文档分析的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAnalysis {
    pub info: PageInfo,
    /// 所有 `<a>` 元素的原始 `href`，按遍历顺序排列
    pub links: Vec<String>,
}

/// 解析HTML并提取页面信息和链接
///
/// 解析器与浏览器行为一致，对任意输入都能构建文档树。
/// 元素按广度优先顺序访问：标题取遇到的第一个 `<title>`，
/// 登录表单指任意包含 `type="password"` 输入框的 `<form>`。
pub fn analyze_document(html: &str) -> PageAnalysis {
    let document = Html::parse_document(html);
    let mut analysis = PageAnalysis::default();

    let mut queue = VecDeque::new();
    queue.push_back(document.root_element());

    while let Some(element) = queue.pop_front() {
        visit(element, &mut analysis);
        queue.extend(element.children().filter_map(ElementRef::wrap));
    }

    // An empty first <title> still decides the title
    analysis.info.title = analysis.info.title.filter(|t| !t.is_empty());
    analysis
}

fn visit(element: ElementRef<'_>, analysis: &mut PageAnalysis) {
    let tag = element.value().name();

    if analysis.info.headings.record(tag) {
        return;
    }

    match tag {
        "title" if analysis.info.title.is_none() => {
            let text = element.text().collect::<String>();
            analysis.info.title = Some(text.trim().to_string());
        }
        "form" if !analysis.info.has_login_form => {
            analysis.info.has_login_form = has_password_input(element);
        }
        "a" => {
            if let Some(href) = element.value().attr("href").filter(|h| !h.is_empty()) {
                analysis.links.push(href.to_string());
            }
        }
        _ => {}
    }
}

fn has_password_input(form: ElementRef<'_>) -> bool {
    form.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "input")
        .any(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("password"))
        })
}
