// SPDX-License-Identifier: AGPL-3.0-or-later
//! Raw backend events and normalized change batches

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::metadata::Metadata;

/// Raw event kinds a backend watch or poller may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventKind {
    Created,
    Modified,
    Removed,
    MovedFrom,
    MovedTo,
}

impl RawEventKind {
    /// Collapse moves into the three delivered operations.
    pub fn normalize(self) -> ChangeKind {
        match self {
            RawEventKind::Created | RawEventKind::MovedTo => ChangeKind::Created,
            RawEventKind::Modified => ChangeKind::Modified,
            RawEventKind::Removed | RawEventKind::MovedFrom => ChangeKind::Removed,
        }
    }
}

/// An unnormalized change notification carrying a backend-native path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub native_path: String,
}

impl RawEvent {
    pub fn new(kind: RawEventKind, native_path: impl Into<String>) -> Self {
        Self { kind, native_path: native_path.into() }
    }

    pub fn created(native_path: impl Into<String>) -> Self {
        Self::new(RawEventKind::Created, native_path)
    }

    pub fn modified(native_path: impl Into<String>) -> Self {
        Self::new(RawEventKind::Modified, native_path)
    }

    pub fn removed(native_path: impl Into<String>) -> Self {
        Self::new(RawEventKind::Removed, native_path)
    }

    pub fn moved_from(native_path: impl Into<String>) -> Self {
        Self::new(RawEventKind::MovedFrom, native_path)
    }

    pub fn moved_to(native_path: impl Into<String>) -> Self {
        Self::new(RawEventKind::MovedTo, native_path)
    }
}

/// Normalized operation delivered to the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// One changed entry; `metadata` is `None` exactly for removals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: String,
    pub metadata: Option<Metadata>,
}

/// Create/modify/remove triple handed to the observer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub modified: Vec<ChangeEntry>,
    pub created: Vec<ChangeEntry>,
    pub removed: Vec<ChangeEntry>,
}

impl ChangeBatch {
    pub fn removed(path: impl Into<String>) -> Self {
        Self {
            removed: vec![ChangeEntry { path: path.into(), metadata: None }],
            ..Default::default()
        }
    }

    pub fn created(metadata: Metadata) -> Self {
        Self {
            created: vec![ChangeEntry { path: metadata.path.clone(), metadata: Some(metadata) }],
            ..Default::default()
        }
    }

    pub fn modified(metadata: Metadata) -> Self {
        Self {
            modified: vec![ChangeEntry { path: metadata.path.clone(), metadata: Some(metadata) }],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.created.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.created.len() + self.removed.len()
    }

    /// The single populated category, if the batch holds exactly one kind.
    pub fn kind(&self) -> Option<ChangeKind> {
        match (self.modified.is_empty(), self.created.is_empty(), self.removed.is_empty()) {
            (false, true, true) => Some(ChangeKind::Modified),
            (true, false, true) => Some(ChangeKind::Created),
            (true, true, false) => Some(ChangeKind::Removed),
            _ => None,
        }
    }
}

/// Receiver of change batches.
///
/// Called on the plugin's bridge task while the plugin guard is held, so an
/// observer must not call back into the same plugin synchronously.
pub trait ChangeObserver: Send + Sync {
    fn on_changes(&self, batch: &ChangeBatch);
}

impl<F> ChangeObserver for F
where
    F: Fn(&ChangeBatch) + Send + Sync,
{
    fn on_changes(&self, batch: &ChangeBatch) {
        self(batch)
    }
}

/// Producer handle for feeding raw events into a plugin's bridge
#[derive(Debug, Clone)]
pub struct RawEventSink {
    tx: mpsc::UnboundedSender<RawEvent>,
}

impl RawEventSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RawEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event. Returns false once the plugin has been closed.
    pub fn send(&self, event: RawEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
