// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage backend plugins for sagfs
//!
//! Two backends: the local filesystem, watched through `notify`, and a data
//! grid reached through a [`GridClient`].

pub mod grid;
mod local;

pub use grid::{GridClient, GridSession, GridSettings};
pub use local::{raw_events, LocalSession};

use sagfs_core::{Plugin, PluginConfig, Role, SagfsResult, Secrets};

pub type LocalPlugin = Plugin<LocalSession>;
pub type GridPlugin<C> = Plugin<GridSession<C>>;

/// Build a plugin over the local filesystem rooted at `config.dataset_root`.
pub fn build_local_plugin(id: impl Into<String>, config: &PluginConfig, role: Role) -> SagfsResult<LocalPlugin> {
    Plugin::new(id, config, role, LocalSession::new())
}

/// Build a data grid plugin; `connector` creates the client once the
/// credentials and `[grid]` table have been checked.
pub fn build_grid_plugin<C, F>(
    id: impl Into<String>,
    config: &PluginConfig,
    role: Role,
    connector: F,
) -> SagfsResult<GridPlugin<C>>
where
    C: GridClient,
    F: FnOnce(&GridSettings, &Secrets) -> SagfsResult<C>,
{
    config.validate()?;
    let session = GridSession::from_config(config, connector)?;
    Plugin::new(id, config, role, session)
}
