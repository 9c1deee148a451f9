// SPDX-License-Identifier: AGPL-3.0-or-later
//! Generic storage plugin
//!
//! [`Plugin`] implements [`StorageBackend`] for any [`NativeSession`]. It
//! owns the path normalizer, the guard around the session, the observer
//! slot and, in [`Role::Discover`], the bridge task draining raw events.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::{
    backend::{Role, StorageBackend},
    bridge::NotificationBridge,
    change::{ChangeBatch, ChangeObserver, RawEvent, RawEventSink},
    config::PluginConfig,
    error::{SagfsError, SagfsResult},
    guard::PluginGuard,
    metadata::Metadata,
    path::PathNormalizer,
    session::NativeSession,
};

/// Session plus lifecycle flags, only reachable through the guard
struct PluginState<S> {
    session: S,
    open: bool,
    watching: bool,
}

struct Shared<S> {
    id: String,
    display_name: String,
    role: Role,
    span: Span,
    bridge: NotificationBridge,
    state: PluginGuard<PluginState<S>>,
    connected: AtomicBool,
    sink: Mutex<Option<RawEventSink>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

pub struct Plugin<S: NativeSession> {
    shared: Arc<Shared<S>>,
}

impl<S: NativeSession> Plugin<S> {
    /// Build a plugin logging into its own `sagfs_plugin` span.
    pub fn new(id: impl Into<String>, config: &PluginConfig, role: Role, session: S) -> SagfsResult<Self> {
        let id = id.into();
        let span = info_span!("sagfs_plugin", plugin = %id, backend = session.kind(), %role);
        Self::new_in_span(id, config, role, session, span)
    }

    /// Build a plugin whose log output is recorded inside `span`.
    pub fn new_in_span(
        id: impl Into<String>,
        config: &PluginConfig,
        role: Role,
        session: S,
        span: Span,
    ) -> SagfsResult<Self> {
        config.validate()?;
        let normalizer = PathNormalizer::new(&config.dataset_root);
        let display_name = session.display_name().to_string();

        Ok(Self {
            shared: Arc::new(Shared {
                id: id.into(),
                display_name,
                role,
                span,
                bridge: NotificationBridge::new(normalizer),
                state: PluginGuard::new(PluginState { session, open: false, watching: false }),
                connected: AtomicBool::new(false),
                sink: Mutex::new(None),
                pump: Mutex::new(None),
            }),
        })
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        self.shared.bridge.normalizer()
    }

    /// Producer handle for raw events, available while a discovering plugin is connected.
    pub fn event_sink(&self) -> Option<RawEventSink> {
        self.shared.sink.lock().clone()
    }

    /// Register a closure as the observer.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&ChangeBatch) + Send + Sync + 'static,
    {
        self.shared.bridge.set_observer(Arc::new(observer));
    }

    /// Process one raw event synchronously, bypassing the event queue.
    ///
    /// Returns the delivered batch, if any. A passive plugin only drops the
    /// cached record for the event's path and never delivers.
    pub async fn dispatch(&self, event: RawEvent) -> Option<ChangeBatch> {
        self.shared.dispatch(event).instrument(self.shared.span.clone()).await
    }

    /// Run `f` against the native session under the guard.
    #[cfg(any(test, feature = "testing"))]
    pub async fn with_session<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut state = self.shared.state.enter().await;
        f(&mut state.session)
    }
}

impl<S: NativeSession> Shared<S> {
    async fn dispatch(&self, event: RawEvent) -> Option<ChangeBatch> {
        let mut state = self.state.enter().await;
        if !state.open {
            debug!(path = %event.native_path, "plugin closed, ignoring raw event");
            return None;
        }
        if !self.role.is_discover() {
            state.session.clear_stat_cache(Some(&event.native_path));
            debug!(path = %event.native_path, "passive plugin, change not delivered");
            return None;
        }
        self.bridge.handle(&mut state.session, event).await
    }

    async fn connect(self: &Arc<Self>) -> SagfsResult<()> {
        let mut state = self.state.enter().await;
        if state.open {
            debug!("already connected");
            return Ok(());
        }

        info!("connecting to {}", self.display_name);
        if let Err(e) = state.session.open().await {
            let _ = self.teardown(&mut state).await;
            return Err(e);
        }
        state.open = true;

        let root = self.bridge.normalizer().root_backend_path().to_string();
        if !state.session.exists(&root).await {
            let _ = self.teardown(&mut state).await;
            return Err(SagfsError::Connection(format!("dataset root does not exist: {}", root)));
        }

        if self.role.is_discover() {
            let (tx, rx) = mpsc::unbounded_channel();
            let sink = RawEventSink::new(tx);

            if let Err(e) = state.session.arm_watch(&root, sink.clone()).await {
                error!(error = %e, "failed to arm watch on {}", root);
                let _ = self.teardown(&mut state).await;
                return Err(e);
            }
            state.watching = true;
            *self.sink.lock() = Some(sink);

            let shared = Arc::clone(self);
            let span = self.span.clone();
            let handle = tokio::spawn(async move { shared.pump(rx).await }.instrument(span));
            *self.pump.lock() = Some(handle);
        }

        self.connected.store(true, Ordering::SeqCst);
        info!("connected");
        Ok(())
    }

    async fn pump(&self, mut rx: mpsc::UnboundedReceiver<RawEvent>) {
        debug!("bridge task started");
        while let Some(event) = rx.recv().await {
            self.dispatch(event).await;
        }
        debug!("bridge task finished");
    }

    /// Release watch and session; each is released at most once.
    async fn teardown(&self, state: &mut PluginState<S>) -> SagfsResult<()> {
        self.connected.store(false, Ordering::SeqCst);

        let pump = self.pump.lock().take();
        if let Some(handle) = pump {
            handle.abort();
            // Wait for the receiver to drop so producers see a closed sink
            let _ = handle.await;
        }
        self.sink.lock().take();

        if state.watching {
            state.watching = false;
            state.session.disarm_watch();
            debug!("watch released");
        }

        if state.open {
            state.open = false;
            state.session.shutdown().await?;
            info!("session closed");
        }
        Ok(())
    }

    async fn close(&self) -> SagfsResult<()> {
        let mut state = self.state.enter().await;
        self.teardown(&mut state).await
    }

    /// Guard over an open session, or `NotConnected`.
    async fn open_state(&self) -> SagfsResult<tokio::sync::MutexGuard<'_, PluginState<S>>> {
        let state = self.state.enter().await;
        if !state.open {
            return Err(SagfsError::NotConnected);
        }
        Ok(state)
    }

    async fn stat(&self, path: &str) -> SagfsResult<Metadata> {
        let mut state = self.open_state().await?;
        let normalizer = self.bridge.normalizer();
        let native = normalizer.to_backend_path(path);
        let canonical = normalizer.to_canonical_path(path);
        let stat = state.session.stat(&native).await?;
        Ok(Metadata::from_native(canonical, stat))
    }

    async fn exists(&self, path: &str) -> bool {
        let Ok(mut state) = self.open_state().await else {
            return false;
        };
        let native = self.bridge.normalizer().to_backend_path(path);
        state.session.exists(&native).await
    }

    async fn list_dir(&self, path: &str) -> SagfsResult<Vec<String>> {
        let mut state = self.open_state().await?;
        let native = self.bridge.normalizer().to_backend_path(path);
        let mut names = state.session.list_dir(&native).await?;
        names.sort();
        Ok(names)
    }

    async fn is_dir(&self, path: &str) -> bool {
        let Ok(mut state) = self.open_state().await else {
            return false;
        };
        let native = self.bridge.normalizer().to_backend_path(path);
        state.session.is_dir(&native).await
    }

    async fn read(&self, path: &str, offset: u64, size: usize) -> Option<Bytes> {
        let native = self.bridge.normalizer().to_backend_path(path);
        let mut state = match self.open_state().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to read {}: {}", native, e);
                return None;
            }
        };
        match state.session.read(&native, offset, size).await {
            Ok(buf) => Some(buf),
            Err(e) => {
                error!("Failed to read {}: {}", native, e);
                None
            }
        }
    }

    async fn clear_cache(&self, path: Option<&str>) {
        let mut state = self.state.enter().await;
        match path {
            Some(path) => {
                let native = self.bridge.normalizer().to_backend_path(path);
                state.session.clear_stat_cache(Some(&native));
            }
            None => state.session.clear_stat_cache(None),
        }
    }
}

#[async_trait]
impl<S: NativeSession> StorageBackend for Plugin<S> {
    fn id(&self) -> &str {
        &self.shared.id
    }

    fn display_name(&self) -> &str {
        &self.shared.display_name
    }

    fn role(&self) -> Role {
        self.shared.role
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> SagfsResult<()> {
        self.shared.connect().instrument(self.shared.span.clone()).await
    }

    async fn close(&self) -> SagfsResult<()> {
        self.shared.close().instrument(self.shared.span.clone()).await
    }

    async fn stat(&self, path: &str) -> SagfsResult<Metadata> {
        self.shared.stat(path).instrument(self.shared.span.clone()).await
    }

    async fn exists(&self, path: &str) -> bool {
        self.shared.exists(path).instrument(self.shared.span.clone()).await
    }

    async fn list_dir(&self, path: &str) -> SagfsResult<Vec<String>> {
        self.shared.list_dir(path).instrument(self.shared.span.clone()).await
    }

    async fn is_dir(&self, path: &str) -> bool {
        self.shared.is_dir(path).instrument(self.shared.span.clone()).await
    }

    async fn read(&self, path: &str, offset: u64, size: usize) -> Option<Bytes> {
        self.shared.read(path, offset, size).instrument(self.shared.span.clone()).await
    }

    async fn clear_cache(&self, path: Option<&str>) {
        self.shared.clear_cache(path).instrument(self.shared.span.clone()).await
    }

    fn set_notification_observer(&self, observer: Arc<dyn ChangeObserver>) {
        self.shared.bridge.set_observer(observer);
    }
}

/// Dropping a plugin stops its bridge task and watch. The backend session
/// needs an async shutdown, which only [`StorageBackend::close`] performs.
impl<S: NativeSession> Drop for Plugin<S> {
    fn drop(&mut self) {
        // The bridge task holds a reference to the shared state
        if let Some(handle) = self.shared.pump.lock().take() {
            handle.abort();
        }
        self.shared.sink.lock().take();
        if let Some(mut state) = self.shared.state.try_enter() {
            if state.watching {
                state.watching = false;
                state.session.disarm_watch();
            }
            if state.open {
                self.shared.span.in_scope(|| {
                    warn!("plugin dropped while connected, session not shut down; call close() first");
                });
            }
        }
    }
}
