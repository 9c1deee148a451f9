// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-instance concurrency guard
//!
//! Queries and bridged raw events take the same guard. Raw events are queued
//! to a single bridge task, which calls the session directly while holding
//! the guard, so nothing ever needs to re-acquire it.

use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

pub struct PluginGuard<T> {
    inner: Mutex<T>,
}

impl<T> PluginGuard<T> {
    pub fn new(value: T) -> Self {
        Self { inner: Mutex::new(value) }
    }

    /// Wait for exclusive access.
    pub async fn enter(&self) -> MutexGuard<'_, T> {
        if let Ok(guard) = self.inner.try_lock() {
            return guard;
        }
        trace!("guard contended, waiting");
        self.inner.lock().await
    }

    /// Exclusive access without waiting, if the guard is free.
    pub fn try_enter(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_enter_serializes() {
        let guard = Arc::new(PluginGuard::new(Vec::<u32>::new()));
        let mut handles = Vec::new();
        for i in 0..8 {
            let guard = Arc::clone(&guard);
            handles.push(tokio::spawn(async move {
                let mut v = guard.enter().await;
                v.push(i);
                tokio::task::yield_now().await;
                v.push(i);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let v = guard.enter().await;
        assert_eq!(v.len(), 16);
        for pair in v.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn test_try_enter_while_held() {
        let guard = PluginGuard::new(0u8);
        let held = guard.enter().await;
        assert!(guard.try_enter().is_none());
        drop(held);
        assert!(guard.try_enter().is_some());
    }
}
