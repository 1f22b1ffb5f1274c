// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::LinkChecker;
use crate::utils::url_utils::{resolve_url, same_host};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use url::Url;

/// 链接归属
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScope {
    Internal,
    External,
}

/// 链接统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTally {
    pub internal: i32,
    pub external: i32,
    pub broken: i32,
}

/// 链接检查过程中收到取消信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCheckCancelled;

/// 是否应当跳过该链接（不计入任何统计）
pub fn is_skippable(link: &str) -> bool {
    let link = link.trim().to_lowercase();
    link.is_empty()
        || link == "#"
        || link.starts_with("javascript:")
        || link.starts_with("mailto:")
        || link.starts_with("tel:")
}

/// 将链接相对页面URL解析并判断归属
///
/// 无法解析的链接视为外部链接，且不返回可检查的地址
pub fn classify(link: &str, base: &Url) -> (LinkScope, Option<Url>) {
    match resolve_url(base, link.trim()) {
        Ok(resolved) if same_host(&resolved, base) => (LinkScope::Internal, Some(resolved)),
        Ok(resolved) => (LinkScope::External, Some(resolved)),
        Err(_) => (LinkScope::External, None),
    }
}

/// 统计内部/外部链接并检查每个链接的可用性
///
/// 归属与可用性是同一组已过滤链接上的两个独立统计。
/// 最多同时进行 `concurrency` 个检查；取消信号到达时立即返回。
pub async fn analyze_links(
    links: &[String],
    base: &Url,
    checker: &dyn LinkChecker,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Result<LinkTally, LinkCheckCancelled> {
    let mut tally = LinkTally::default();
    let mut targets = Vec::new();

    for link in links.iter().filter(|l| !is_skippable(l)) {
        let (scope, resolved) = classify(link, base);
        match scope {
            LinkScope::Internal => tally.internal += 1,
            LinkScope::External => tally.external += 1,
        }
        targets.push(resolved);
    }

    let checks = stream::iter(targets)
        .map(|target| async move {
            match target {
                Some(url) => checker.is_broken(url.as_str()).await,
                None => true,
            }
        })
        .buffer_unordered(concurrency.max(1))
        .fold(0, |broken, is_broken| async move {
            if is_broken {
                broken + 1
            } else {
                broken
            }
        });

    tokio::select! {
        _ = cancel.cancelled() => Err(LinkCheckCancelled),
        broken = checks => {
            tally.broken = broken;
            Ok(tally)
        }
    }
}
