// SPDX-License-Identifier: AGPL-3.0-or-later
//! sagfs core
//!
//! Path normalization, change bridging and the capability contract shared by
//! every sagfs storage plugin.

pub mod backend;
pub mod bridge;
pub mod change;
pub mod config;
pub mod error;
pub mod guard;
pub mod metadata;
pub mod path;
pub mod plugin;
pub mod session;

pub use backend::{Role, StorageBackend};
pub use change::{ChangeBatch, ChangeEntry, ChangeKind, ChangeObserver, RawEvent, RawEventKind, RawEventSink};
pub use config::{PluginConfig, Secrets};
pub use error::{SagfsError, SagfsResult};
pub use metadata::{Metadata, NativeStat};
pub use path::PathNormalizer;
pub use plugin::Plugin;
pub use session::NativeSession;
