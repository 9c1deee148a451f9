// SPDX-License-Identifier: AGPL-3.0-or-later
//! Change-notification bridge
//!
//! Turns raw backend events into [`ChangeBatch`]es. Moves are split into a
//! removal and a creation, the cache entry is always invalidated first, and
//! creations and modifications carry freshly fetched metadata. Every
//! delivered batch has exactly one populated category holding one entry.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    change::{ChangeBatch, ChangeKind, ChangeObserver, RawEvent},
    metadata::Metadata,
    path::PathNormalizer,
    session::NativeSession,
};

pub struct NotificationBridge {
    normalizer: PathNormalizer,
    observer: RwLock<Option<Arc<dyn ChangeObserver>>>,
}

impl NotificationBridge {
    pub fn new(normalizer: PathNormalizer) -> Self {
        Self {
            normalizer,
            observer: RwLock::new(None),
        }
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Replace the registered observer.
    pub fn set_observer(&self, observer: Arc<dyn ChangeObserver>) {
        *self.observer.write() = Some(observer);
    }

    pub fn clear_observer(&self) {
        self.observer.write().take();
    }

    pub fn has_observer(&self) -> bool {
        self.observer.read().is_some()
    }

    /// Translate one raw event and deliver it.
    ///
    /// The caller must hold the plugin guard for `session`. Returns the
    /// delivered batch, or `None` when the event was dropped.
    pub async fn handle<S: NativeSession>(&self, session: &mut S, event: RawEvent) -> Option<ChangeBatch> {
        let kind = event.kind.normalize();
        let canonical = self.normalizer.to_canonical_path(&event.native_path);

        session.clear_stat_cache(Some(&event.native_path));

        let observer = self.observer.read().clone();
        let Some(observer) = observer else {
            debug!(path = %canonical, ?kind, "no observer registered, dropping change");
            return None;
        };

        let batch = match kind {
            ChangeKind::Removed => ChangeBatch::removed(canonical),
            ChangeKind::Created | ChangeKind::Modified => {
                let stat = match session.stat(&event.native_path).await {
                    Ok(stat) => stat,
                    Err(e) if e.is_transient() => {
                        debug!(path = %canonical, ?kind, "entry vanished before re-stat, dropping change");
                        return None;
                    }
                    Err(e) => {
                        warn!(path = %canonical, ?kind, error = %e, "re-stat failed, dropping change");
                        return None;
                    }
                };
                let metadata = Metadata::from_native(canonical, stat);
                if kind == ChangeKind::Created {
                    ChangeBatch::created(metadata)
                } else {
                    ChangeBatch::modified(metadata)
                }
            }
        };

        observer.on_changes(&batch);
        Some(batch)
    }
}
