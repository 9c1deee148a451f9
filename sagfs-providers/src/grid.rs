// SPDX-License-Identifier: AGPL-3.0-or-later
//! Data grid backend
//!
//! The wire protocol lives behind [`GridClient`]; this module adds the
//! connection settings, credential checks and a stat cache keyed by grid
//! path. The grid has no native watch: raw events are injected through
//! [`sagfs_core::Plugin::event_sink`] or [`sagfs_core::Plugin::dispatch`].

use async_trait::async_trait;
use bytes::Bytes;
use sagfs_cache::{CacheStats, StatCache};
use sagfs_core::{NativeSession, NativeStat, PluginConfig, SagfsError, SagfsResult, Secrets};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Config table name for grid settings
pub const GRID_SECTION: &str = "grid";

pub const DEFAULT_PORT: u16 = 1247;

/// `[grid]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub zone: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl GridSettings {
    /// Read and check the `[grid]` table of `config`.
    pub fn from_config(config: &PluginConfig) -> SagfsResult<Self> {
        let settings: GridSettings = config.section(GRID_SECTION)?;
        if settings.host.trim().is_empty() {
            return Err(SagfsError::Configuration("grid.host is not given".into()));
        }
        if settings.zone.trim().is_empty() {
            return Err(SagfsError::Configuration("grid.zone is not given".into()));
        }
        Ok(settings)
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.zone)
    }
}

/// Connection to a data grid, addressed by grid-native paths
#[async_trait]
pub trait GridClient: Send + 'static {
    async fn connect(&mut self) -> SagfsResult<()>;

    async fn close(&mut self) -> SagfsResult<()>;

    /// `NotFound` when the object or collection does not exist.
    async fn stat(&mut self, path: &str) -> SagfsResult<NativeStat>;

    async fn exists(&mut self, path: &str) -> SagfsResult<bool>;

    /// Names of the direct children of a collection.
    async fn list_dir(&mut self, path: &str) -> SagfsResult<Vec<String>>;

    async fn read(&mut self, path: &str, offset: u64, size: usize) -> SagfsResult<Bytes>;
}

/// Native session over a [`GridClient`]
pub struct GridSession<C> {
    settings: GridSettings,
    user: String,
    client: C,
    cache: StatCache<NativeStat>,
    display_name: String,
}

impl<C: GridClient> GridSession<C> {
    pub fn new(settings: GridSettings, user: impl Into<String>, client: C) -> Self {
        let display_name = format!("Data Grid ({})", settings.endpoint());
        Self {
            settings,
            user: user.into(),
            client,
            cache: StatCache::new(),
            display_name,
        }
    }

    /// Check credentials and `[grid]` settings, then build the client.
    pub fn from_config<F>(config: &PluginConfig, connector: F) -> SagfsResult<Self>
    where
        F: FnOnce(&GridSettings, &Secrets) -> SagfsResult<C>,
    {
        let secrets = config.require_secrets()?;
        let settings = GridSettings::from_config(config)?;
        let client = connector(&settings, secrets)?;
        Ok(Self::new(settings, secrets.user.clone(), client))
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains(path)
    }
}

#[async_trait]
impl<C: GridClient> NativeSession for GridSession<C> {
    fn kind(&self) -> &'static str {
        "grid"
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn open(&mut self) -> SagfsResult<()> {
        self.client.connect().await.map_err(|e| match e {
            SagfsError::Connection(_) => e,
            other => SagfsError::Connection(format!("{}: {}", self.settings.endpoint(), other)),
        })?;
        info!(user = %self.user, "connected to {}", self.settings.endpoint());
        Ok(())
    }

    async fn shutdown(&mut self) -> SagfsResult<()> {
        self.cache.clear();
        self.client.close().await
    }

    async fn stat(&mut self, path: &str) -> SagfsResult<NativeStat> {
        if let Some(stat) = self.cache.get(path) {
            return Ok(stat);
        }
        let stat = self.client.stat(path).await?;
        self.cache.insert(path, stat.clone());
        Ok(stat)
    }

    async fn exists(&mut self, path: &str) -> bool {
        if self.cache.contains(path) {
            return true;
        }
        match self.client.exists(path).await {
            Ok(found) => found,
            Err(e) => {
                warn!(path, error = %e, "exists check failed");
                false
            }
        }
    }

    async fn is_dir(&mut self, path: &str) -> bool {
        match self.stat(path).await {
            Ok(stat) => stat.is_directory,
            Err(e) => {
                debug!(path, error = %e, "is_dir: no such collection");
                false
            }
        }
    }

    async fn list_dir(&mut self, path: &str) -> SagfsResult<Vec<String>> {
        if !self.stat(path).await?.is_directory {
            return Err(SagfsError::NotADirectory(path.to_string()));
        }
        self.client.list_dir(path).await
    }

    async fn read(&mut self, path: &str, offset: u64, size: usize) -> SagfsResult<Bytes> {
        self.client.read(path, offset, size).await
    }

    fn clear_stat_cache(&mut self, path: Option<&str>) {
        self.cache.invalidate_path_or_all(path);
    }
}
