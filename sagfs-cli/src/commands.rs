// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use chrono::{DateTime, Utc};
use console::style;
use sagfs_core::{ChangeBatch, Metadata, PluginConfig, Role, SagfsError, SagfsResult, StorageBackend};
use sagfs_providers::{build_local_plugin, LocalPlugin};
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::debug;

/// Default configuration file, used when neither `--config` nor `--root` is given
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "hyperpolymath", "sagfs")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Resolve the plugin configuration from the command line
pub fn load_config(config: Option<&Path>, root: Option<&Path>) -> SagfsResult<PluginConfig> {
    if let Some(root) = root {
        let root = root.canonicalize().map_err(|e| {
            SagfsError::Configuration(format!("dataset root {}: {}", root.display(), e))
        })?;
        return Ok(PluginConfig::new(root.to_string_lossy()));
    }

    if let Some(path) = config {
        return PluginConfig::load(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => PluginConfig::load(path),
        Some(path) => Err(SagfsError::Configuration(format!(
            "no dataset root given; pass --root or --config, or create {}",
            path.display()
        ))),
        None => Err(SagfsError::Configuration(
            "no dataset root given; pass --root or --config".into(),
        )),
    }
}

async fn connect(config: &PluginConfig, role: Role) -> SagfsResult<LocalPlugin> {
    let plugin = build_local_plugin("local", config, role)?;
    debug!(root = %plugin.normalizer(), %role, "connecting");
    plugin.connect().await?;
    Ok(plugin)
}

/// Join a canonical directory path and an entry name
fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn format_time(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

fn format_size(size: u64, human: bool) -> String {
    if human {
        bytesize::ByteSize(size).to_string()
    } else {
        size.to_string()
    }
}

fn format_kind(meta: &Metadata) -> String {
    if meta.is_directory {
        style("d").cyan().to_string()
    } else {
        "-".to_string()
    }
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Name")]
    name: String,
}

/// Show metadata as JSON
pub async fn stat(config: &PluginConfig, path: &str, verbose: bool) -> SagfsResult<()> {
    let plugin = connect(config, Role::Passive).await?;
    let meta = plugin.stat(path).await?;

    if verbose && meta.is_file() {
        eprintln!("Size: {}", bytesize::ByteSize(meta.size));
    }
    println!("{}", to_json(&meta)?);

    plugin.close().await
}

/// List directory contents
pub async fn ls(config: &PluginConfig, path: &str, long: bool, human: bool) -> SagfsResult<()> {
    let plugin = connect(config, Role::Passive).await?;
    let names = plugin.list_dir(path).await?;

    if long {
        let mut entries = Vec::with_capacity(names.len());
        for name in &names {
            // Entries can vanish between listing and stat
            let meta = match plugin.stat(&join_path(path, name)).await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(%name, error = %e, "skipping entry");
                    continue;
                }
            };
            entries.push(LsEntry {
                kind: format_kind(&meta),
                size: format_size(meta.size, human),
                modified: format_time(meta.modified_at),
                name: name.clone(),
            });
        }
        if !entries.is_empty() {
            println!("{}", Table::new(entries));
        }
    } else {
        for name in names {
            println!("{name}");
        }
    }

    plugin.close().await
}

/// Write a byte range of a file to stdout
pub async fn cat(config: &PluginConfig, path: &str, offset: u64, size: Option<usize>) -> SagfsResult<()> {
    let plugin = connect(config, Role::Passive).await?;

    let size = match size {
        Some(size) => size,
        None => {
            let meta = plugin.stat(path).await?;
            usize::try_from(meta.size.saturating_sub(offset)).unwrap_or(usize::MAX)
        }
    };

    let data = plugin
        .read(path, offset, size)
        .await
        .ok_or_else(|| SagfsError::backend("local", format!("cannot read {path}")))?;
    std::io::stdout().write_all(&data)?;

    plugin.close().await
}

pub async fn exists(config: &PluginConfig, path: &str) -> SagfsResult<()> {
    let plugin = connect(config, Role::Passive).await?;
    println!("{}", plugin.exists(path).await);
    plugin.close().await
}

pub async fn is_dir(config: &PluginConfig, path: &str) -> SagfsResult<()> {
    let plugin = connect(config, Role::Passive).await?;
    println!("{}", plugin.is_dir(path).await);
    plugin.close().await
}

/// Follow changes under the dataset root until Ctrl-C
pub async fn watch(config: &PluginConfig, verbose: bool) -> SagfsResult<()> {
    let plugin = build_local_plugin("local", config, Role::Discover)?;
    plugin.observe(move |batch: &ChangeBatch| {
        if verbose {
            match to_json(batch) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: {e}"),
            }
        } else {
            for line in describe_batch(batch) {
                println!("{line}");
            }
        }
    });
    plugin.connect().await?;

    eprintln!(
        "{} {} (Ctrl-C to stop)",
        style("Watching").green().bold(),
        plugin.normalizer()
    );
    tokio::signal::ctrl_c().await?;

    plugin.close().await
}

/// One line per entry: `+` created, `~` modified, `-` removed
fn describe_batch(batch: &ChangeBatch) -> Vec<String> {
    let mut lines = Vec::with_capacity(batch.len());
    for entry in &batch.created {
        lines.push(format!("{} {}", style("+").green(), entry.path));
    }
    for entry in &batch.modified {
        lines.push(format!("{} {}", style("~").yellow(), entry.path));
    }
    for entry in &batch.removed {
        lines.push(format!("{} {}", style("-").red(), entry.path));
    }
    lines
}

fn to_json<T: serde::Serialize>(value: &T) -> SagfsResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| SagfsError::backend("json", e.to_string()))
}
