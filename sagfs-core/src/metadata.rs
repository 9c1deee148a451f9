// SPDX-License-Identifier: AGPL-3.0-or-later
//! File and directory metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::base_name;

/// Backend-level stat record, addressed by native path.
///
/// Sessions return this; the plugin attaches the canonical path and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeStat {
    pub is_directory: bool,
    pub size: u64,
    pub checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl NativeStat {
    pub fn file(size: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            is_directory: false,
            size,
            checksum: None,
            created_at: modified_at,
            modified_at,
        }
    }

    pub fn directory(modified_at: DateTime<Utc>) -> Self {
        Self {
            is_directory: true,
            size: 0,
            checksum: None,
            created_at: modified_at,
            modified_at,
        }
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn with_created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Metadata record for one entry in the driver namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub is_directory: bool,
    /// Canonical path
    pub path: String,
    pub name: String,
    /// Byte count, 0 for directories
    pub size: u64,
    /// Content checksum, if the backend provides one
    pub checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Metadata {
    pub fn from_native(canonical_path: impl Into<String>, stat: NativeStat) -> Self {
        let path = canonical_path.into();
        let name = base_name(&path).to_string();
        Self {
            is_directory: stat.is_directory,
            size: if stat.is_directory { 0 } else { stat.size },
            checksum: stat.checksum,
            created_at: stat.created_at,
            modified_at: stat.modified_at,
            path,
            name,
        }
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_native_file() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let meta = Metadata::from_native("/sub/file.txt", NativeStat::file(10, t).with_checksum("abc"));
        assert_eq!(meta.path, "/sub/file.txt");
        assert_eq!(meta.name, "file.txt");
        assert_eq!(meta.size, 10);
        assert!(meta.is_file());
        assert_eq!(meta.checksum.as_deref(), Some("abc"));
        assert_eq!(meta.created_at, t);
    }

    #[test]
    fn test_directory_size_is_zero() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut stat = NativeStat::directory(t);
        stat.size = 4096;
        let meta = Metadata::from_native("/sub", stat);
        assert!(meta.is_directory);
        assert_eq!(meta.size, 0);
        assert_eq!(meta.name, "sub");
    }

    #[test]
    fn test_serde_shape() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let meta = Metadata::from_native("/a.bin", NativeStat::file(3, t));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["path"], "/a.bin");
        assert_eq!(json["size"], 3);
        assert!(json["checksum"].is_null());
    }
}
