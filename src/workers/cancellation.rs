// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 取消句柄注册表
///
/// 记录正在执行的任务ID到其取消令牌的映射。
/// 写入发生在认领后注册和执行结束后移除，读取发生在取消请求时。
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    handles: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册任务的取消令牌
    ///
    /// 返回的守卫在被丢弃时无条件移除该条目，
    /// 覆盖成功、失败、取消和panic展开等所有返回路径
    #[must_use = "the registration is removed as soon as the guard is dropped"]
    pub fn register(&self, job_id: Uuid, token: CancellationToken) -> RegistrationGuard {
        self.handles.write().insert(job_id, token);
        RegistrationGuard {
            registry: self.clone(),
            job_id,
        }
    }

    /// 取消正在执行的任务
    ///
    /// 找到对应条目时触发其令牌并返回 `true`，否则返回 `false`
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.handles.read().get(&job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// 任务是否处于执行中
    pub fn is_active(&self, job_id: Uuid) -> bool {
        self.handles.read().contains_key(&job_id)
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    fn remove(&self, job_id: Uuid) {
        self.handles.write().remove(&job_id);
    }
}

/// 注册守卫，丢弃时移除注册表中的条目
pub struct RegistrationGuard {
    registry: CancellationRegistry,
    job_id: Uuid,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.remove(self.job_id);
    }
}
