// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage backend trait

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{change::ChangeObserver, error::SagfsResult, metadata::Metadata};

/// Whether a plugin instance actively reports changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Watch the dataset and deliver change batches
    #[default]
    Discover,
    /// Serve on-demand queries only
    Passive,
}

impl Role {
    pub fn is_discover(self) -> bool {
        self == Role::Discover
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Discover => f.write_str("discover"),
            Role::Passive => f.write_str("passive"),
        }
    }
}

/// Capability contract between a driver and a storage plugin.
///
/// Paths are canonical (rooted at `/`, relative to the dataset root). All
/// state-touching operations are serialized per instance.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    fn role(&self) -> Role;
    fn is_connected(&self) -> bool;

    /// Open the backend session, and in [`Role::Discover`] arm the raw-event source.
    async fn connect(&self) -> SagfsResult<()>;

    /// Release the watch and the session. Calling it again is a no-op.
    ///
    /// Dropping a connected backend only stops its watch; the session is
    /// shut down here and nowhere else.
    async fn close(&self) -> SagfsResult<()>;

    async fn stat(&self, path: &str) -> SagfsResult<Metadata>;

    /// Never fails; inaccessible paths report `false`.
    async fn exists(&self, path: &str) -> bool;

    /// Child names of a directory.
    async fn list_dir(&self, path: &str) -> SagfsResult<Vec<String>>;

    /// `false` for missing paths.
    async fn is_dir(&self, path: &str) -> bool;

    /// Read up to `size` bytes at `offset`.
    ///
    /// Backend failures are logged and reported as `None`, which callers must
    /// treat as "unavailable" rather than empty.
    async fn read(&self, path: &str, offset: u64, size: usize) -> Option<Bytes>;

    /// Drop cached metadata for `path`, or for everything when `None`.
    async fn clear_cache(&self, path: Option<&str>);

    /// Replace the observer that receives change batches.
    fn set_notification_observer(&self, observer: Arc<dyn ChangeObserver>);
}
