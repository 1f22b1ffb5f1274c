// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use url::{ParseError, Url};

static SCHEME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("valid scheme regex"));
static WWW_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^www\.").expect("valid www regex"));
static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid slug regex"));

const MAX_SLUG_LEN: usize = 20;

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 判断两个URL是否指向同一主机
///
/// 只比较主机名和显式端口，协议默认端口不参与比较，
/// 因此同一站点的 http 与 https 地址视为同一主机
pub fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

/// 将URL转换为适合作为文件名的短标识
///
/// 去掉协议和 `www.` 前缀，非字母数字字符串替换为 `-`，
/// 转为小写并截断到20个字符
pub fn url_to_slug(url: &str) -> String {
    let slug = SCHEME_PREFIX.replace(url, "");
    let slug = WWW_PREFIX.replace(&slug, "");
    let slug = NON_ALPHANUMERIC.replace_all(&slug, "-");
    let mut slug = slug.trim_matches('-').to_lowercase();

    // Only ASCII remains after the replacement above
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// 生成截图文件名：`<unix纳秒>-<slug>.png`
pub fn screenshot_file_name(url: &str, unix_nanos: i64) -> String {
    format!("{}-{}.png", unix_nanos, url_to_slug(url))
}
