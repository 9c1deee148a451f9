// SPDX-License-Identifier: AGPL-3.0-or-later
//! Native session contract implemented by each backend variant
//!
//! A session speaks backend-native paths only. [`crate::Plugin`] wraps it
//! with path normalization, the concurrency guard and the change bridge.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    change::RawEventSink,
    error::SagfsResult,
    metadata::NativeStat,
};

#[async_trait]
pub trait NativeSession: Send + 'static {
    /// Short backend identifier, e.g. `"local"`
    fn kind(&self) -> &'static str;

    fn display_name(&self) -> &str;

    /// Establish the backend session.
    async fn open(&mut self) -> SagfsResult<()>;

    /// Release the backend session. Called at most once per successful `open`.
    async fn shutdown(&mut self) -> SagfsResult<()>;

    async fn stat(&mut self, path: &str) -> SagfsResult<NativeStat>;

    async fn exists(&mut self, path: &str) -> bool;

    async fn is_dir(&mut self, path: &str) -> bool;

    async fn list_dir(&mut self, path: &str) -> SagfsResult<Vec<String>>;

    async fn read(&mut self, path: &str, offset: u64, size: usize) -> SagfsResult<Bytes>;

    /// Invalidate cached stat records. Sessions without a cache ignore this.
    fn clear_stat_cache(&mut self, _path: Option<&str>) {}

    /// Start the native watch on `root`, pushing raw events into `sink`.
    ///
    /// Backends without a native watch keep the default; their events
    /// arrive through the plugin's event sink from an external poller.
    async fn arm_watch(&mut self, _root: &str, _sink: RawEventSink) -> SagfsResult<()> {
        Ok(())
    }

    /// Stop the native watch, if any.
    fn disarm_watch(&mut self) {}
}
