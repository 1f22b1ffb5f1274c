// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!DOCTYPE\s+([^>]+)>").expect("valid doctype regex"));

pub const UNKNOWN_VERSION: &str = "Unknown";

/// 按匹配顺序排列的文档类型标签
const LEGACY_DOCTYPES: &[(&str, &str)] = &[
    ("xhtml 1.0 strict", "XHTML 1.0 Strict"),
    ("xhtml 1.0 transitional", "XHTML 1.0 Transitional"),
    ("xhtml 1.0 frameset", "XHTML 1.0 Frameset"),
    ("xhtml 1.1", "XHTML 1.1"),
    ("html 4.01 strict", "HTML 4.01 Strict"),
    ("html 4.01 transitional", "HTML 4.01 Transitional"),
    ("html 4.01 frameset", "HTML 4.01 Frameset"),
];

/// 根据原始HTML中的第一个 `<!DOCTYPE ...>` 声明识别文档版本
pub fn detect_html_version(html: &str) -> &'static str {
    let Some(declaration) = DOCTYPE.captures(html).and_then(|c| c.get(1)) else {
        return UNKNOWN_VERSION;
    };

    let doctype = declaration.as_str().trim().to_lowercase();
    if doctype == "html" {
        return "HTML5";
    }

    LEGACY_DOCTYPES
        .iter()
        .find(|(needle, _)| doctype.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_VERSION)
}
