// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path normalization between the driver namespace and backend namespaces
//!
//! Canonical paths are rooted at `/` and relative to the dataset root.
//! Backend paths are the same entries with the dataset root prepended.
//! Every plugin goes through one [`PathNormalizer`], so the query path and
//! the change bridge always agree on the mapping.

use std::fmt;

/// Bidirectional mapping between canonical and backend-native paths
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathNormalizer {
    /// Dataset root with trailing slashes removed
    dataset_root: String,
}

impl PathNormalizer {
    pub fn new(dataset_root: impl AsRef<str>) -> Self {
        Self {
            dataset_root: dataset_root.as_ref().trim_end_matches('/').to_string(),
        }
    }

    pub fn dataset_root(&self) -> &str {
        &self.dataset_root
    }

    /// Native path of the dataset root itself.
    ///
    /// A root of `/` trims to the empty prefix, which still has to address `/`.
    pub fn root_backend_path(&self) -> &str {
        if self.dataset_root.is_empty() {
            "/"
        } else {
            &self.dataset_root
        }
    }

    /// Canonical path to backend-native path.
    ///
    /// The prefix test is a plain string comparison, matching what the
    /// backends themselves report.
    pub fn to_backend_path(&self, canonical: &str) -> String {
        if canonical.starts_with(&self.dataset_root) {
            return canonical.to_string();
        }

        if canonical.starts_with('/') {
            return format!("{}{}", self.dataset_root, canonical);
        }

        format!("{}/{}", self.dataset_root, canonical)
    }

    /// Backend-native path to canonical path.
    ///
    /// Paths outside the dataset root are returned unchanged.
    pub fn to_canonical_path(&self, backend_path: &str) -> String {
        match backend_path.strip_prefix(&self.dataset_root) {
            Some(rest) => rest.to_string(),
            None => backend_path.to_string(),
        }
    }
}

impl fmt::Display for PathNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root_backend_path())
    }
}

/// Last `/`-separated component of a path, empty for the root
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_trimmed() {
        let norm = PathNormalizer::new("/data///");
        assert_eq!(norm.dataset_root(), "/data");
        assert_eq!(norm.root_backend_path(), "/data");
    }

    #[test]
    fn test_to_backend_absolute() {
        let norm = PathNormalizer::new("/data");
        assert_eq!(norm.to_backend_path("/sub/file.txt"), "/data/sub/file.txt");
        assert_eq!(norm.to_backend_path("/"), "/data/");
    }

    #[test]
    fn test_to_backend_relative() {
        let norm = PathNormalizer::new("/data");
        assert_eq!(norm.to_backend_path("sub/file.txt"), "/data/sub/file.txt");
    }

    #[test]
    fn test_to_backend_already_native() {
        let norm = PathNormalizer::new("/data");
        assert_eq!(norm.to_backend_path("/data/sub"), "/data/sub");
    }

    #[test]
    fn test_to_canonical() {
        let norm = PathNormalizer::new("/data");
        assert_eq!(norm.to_canonical_path("/data/sub/file.txt"), "/sub/file.txt");
        assert_eq!(norm.to_canonical_path("/data"), "");
    }

    #[test]
    fn test_to_canonical_outside_root() {
        let norm = PathNormalizer::new("/data");
        assert_eq!(norm.to_canonical_path("/elsewhere/x"), "/elsewhere/x");
    }

    #[test]
    fn test_round_trip() {
        let norm = PathNormalizer::new("/zone/home/alice/dataset");
        for p in ["/", "/a", "/a/b/c.txt", "/with space/x", "/.hidden", "/a//b"] {
            assert_eq!(norm.to_canonical_path(&norm.to_backend_path(p)), p);
        }
    }

    #[test]
    fn test_slash_root() {
        let norm = PathNormalizer::new("/");
        assert_eq!(norm.dataset_root(), "");
        assert_eq!(norm.root_backend_path(), "/");
        assert_eq!(norm.to_backend_path("/etc/hosts"), "/etc/hosts");
        assert_eq!(norm.to_canonical_path("/etc/hosts"), "/etc/hosts");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/sub/file.txt"), "file.txt");
        assert_eq!(base_name("/file"), "file");
        assert_eq!(base_name("/"), "");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_display() {
        assert_eq!(PathNormalizer::new("/data/").to_string(), "/data");
        assert_eq!(PathNormalizer::new("/").to_string(), "/");
    }
}
