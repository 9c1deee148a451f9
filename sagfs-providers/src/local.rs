// SPDX-License-Identifier: AGPL-3.0-or-later
//! Local filesystem backend
//!
//! Queries go through `tokio::fs`. In discover role a `notify` watcher
//! follows the dataset root recursively and pushes raw events from its own
//! thread into the plugin's event sink.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use sagfs_core::{
    NativeSession, NativeStat, RawEvent, RawEventKind, RawEventSink, SagfsError, SagfsResult,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

/// Local filesystem session
pub struct LocalSession {
    watcher: Option<(RecommendedWatcher, PathBuf)>,
}

impl LocalSession {
    pub fn new() -> Self {
        Self { watcher: None }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn stat_from_metadata(meta: &std::fs::Metadata) -> NativeStat {
        let modified: DateTime<Utc> = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let created: DateTime<Utc> = meta.created().map(DateTime::<Utc>::from).unwrap_or(modified);

        if meta.is_dir() {
            NativeStat::directory(modified).with_created(created)
        } else {
            NativeStat::file(meta.len(), modified).with_created(created)
        }
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NativeSession for LocalSession {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn display_name(&self) -> &str {
        "Local Filesystem"
    }

    async fn open(&mut self) -> SagfsResult<()> {
        Ok(())
    }

    async fn shutdown(&mut self) -> SagfsResult<()> {
        Ok(())
    }

    async fn stat(&mut self, path: &str) -> SagfsResult<NativeStat> {
        let meta = fs::metadata(path).await.map_err(|e| SagfsError::from_io(path, e))?;
        Ok(Self::stat_from_metadata(&meta))
    }

    async fn exists(&mut self, path: &str) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&mut self, path: &str) -> bool {
        match fs::metadata(path).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        }
    }

    async fn list_dir(&mut self, path: &str) -> SagfsResult<Vec<String>> {
        let meta = fs::metadata(path).await.map_err(|e| SagfsError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(SagfsError::NotADirectory(path.to_string()));
        }

        let mut names = Vec::new();
        let mut read_dir = fs::read_dir(path).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn read(&mut self, path: &str, offset: u64, size: usize) -> SagfsResult<Bytes> {
        let mut file = fs::File::open(path).await.map_err(|e| SagfsError::from_io(path, e))?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;

        let mut buffer = Vec::with_capacity(size.min(1 << 20));
        file.take(size as u64).read_to_end(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }

    async fn arm_watch(&mut self, root: &str, sink: RawEventSink) -> SagfsResult<()> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for raw in raw_events(&event) {
                    debug!(kind = ?raw.kind, path = %raw.native_path, "raw event");
                    if !sink.send(raw) {
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        })
        .map_err(|e| SagfsError::Watch(e.to_string()))?;

        let root = PathBuf::from(root);
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| SagfsError::Watch(format!("{}: {}", root.display(), e)))?;

        info!("watching {}", root.display());
        self.watcher = Some((watcher, root));
        Ok(())
    }

    fn disarm_watch(&mut self) {
        if let Some((mut watcher, root)) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&root) {
                debug!(error = %e, "unwatch {}", root.display());
            }
        }
    }
}

/// Translate one `notify` event into raw events, one per affected path.
///
/// Attribute changes count as modifications. A rename is reported through
/// its From and To halves; the combined Both event that follows them is
/// skipped. Renames reported without a direction are resolved by whether
/// the path still exists.
pub fn raw_events(event: &notify::Event) -> Vec<RawEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => RawEventKind::Created,
        EventKind::Remove(_) => RawEventKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => RawEventKind::MovedFrom,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => RawEventKind::MovedTo,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // inotify pairs a From and a To that were already reported
            debug!(?event, "rename pair already reported by its halves");
            return Vec::new();
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .iter()
                .map(|p| {
                    let kind = if p.exists() { RawEventKind::MovedTo } else { RawEventKind::MovedFrom };
                    RawEvent::new(kind, path_string(p))
                })
                .collect();
        }
        EventKind::Modify(_) => RawEventKind::Modified,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => {
            debug!(?event, "unhandled event");
            return Vec::new();
        }
    };

    event.paths.iter().map(|p| RawEvent::new(kind, path_string(p))).collect()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut ev = notify::Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    #[test]
    fn test_create_and_remove() {
        let out = raw_events(&event(EventKind::Create(CreateKind::File), &["/data/a"]));
        assert_eq!(out, vec![RawEvent::created("/data/a")]);

        let out = raw_events(&event(EventKind::Remove(RemoveKind::Folder), &["/data/d"]));
        assert_eq!(out, vec![RawEvent::removed("/data/d")]);
    }

    #[test]
    fn test_data_and_attribute_changes_are_modifications() {
        let out = raw_events(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/data/a"],
        ));
        assert_eq!(out, vec![RawEvent::modified("/data/a")]);

        let out = raw_events(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/data/a"],
        ));
        assert_eq!(out, vec![RawEvent::modified("/data/a")]);
    }

    #[test]
    fn test_rename_halves() {
        let out = raw_events(&event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["/data/a"]));
        assert_eq!(out, vec![RawEvent::moved_from("/data/a")]);

        let out = raw_events(&event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["/data/b"]));
        assert_eq!(out, vec![RawEvent::moved_to("/data/b")]);
    }

    #[test]
    fn test_rename_reported_once() {
        // inotify sequence for one rename: From, To, then Both
        let sequence = [
            event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["/data/a"]),
            event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["/data/b"]),
            event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["/data/a", "/data/b"]),
        ];
        let out: Vec<RawEvent> = sequence.iter().flat_map(raw_events).collect();
        assert_eq!(out, vec![RawEvent::moved_from("/data/a"), RawEvent::moved_to("/data/b")]);
    }

    #[test]
    fn test_rename_without_direction_uses_existence() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present");
        std::fs::write(&present, b"x").unwrap();
        let absent = dir.path().join("absent");

        let mut ev = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)));
        ev = ev.add_path(absent.clone()).add_path(present.clone());

        let out = raw_events(&ev);
        assert_eq!(
            out,
            vec![
                RawEvent::moved_from(absent.to_string_lossy()),
                RawEvent::moved_to(present.to_string_lossy()),
            ]
        );
    }

    #[test]
    fn test_access_ignored() {
        let out = raw_events(&event(EventKind::Access(AccessKind::Any), &["/data/a"]));
        assert!(out.is_empty());
    }
}
