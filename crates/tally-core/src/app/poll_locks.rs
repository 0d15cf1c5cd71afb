//! PollLocks - poll 単位の直列化
//!
//! 同じ poll に対する reconcile / vote は同一プロセス内で一つずつ実行する。
//! プロセスを跨ぐ競合は PollStore の version で検出する。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::ids::PollId;

#[derive(Debug, Default)]
pub struct PollLocks {
    locks: Mutex<HashMap<PollId, Arc<AsyncMutex<()>>>>,
}

impl PollLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. The guard releases it on drop.
    pub async fn lock(&self, id: PollId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // entries only the map still references are idle
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of polls currently locked or waited on.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|m| Arc::strong_count(m) > 1)
            .count()
    }
}
