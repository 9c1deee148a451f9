// SPDX-License-Identifier: AGPL-3.0-or-later
//! Plugin configuration
//!
//! The core only interprets `dataset_root` and the optional `[secrets]`
//! table. Every other top-level table is kept opaque and handed to the
//! backend that asks for it by name.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{SagfsError, SagfsResult};

/// Credentials for backends that need them
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Construction parameters for one plugin instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    pub dataset_root: String,
    #[serde(default)]
    pub secrets: Option<Secrets>,
    /// Backend-specific tables, e.g. `[grid]`
    #[serde(flatten)]
    pub sections: toml::Table,
}

impl PluginConfig {
    pub fn new(dataset_root: impl Into<String>) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            ..Default::default()
        }
    }

    pub fn with_secrets(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.secrets = Some(Secrets { user: user.into(), password: password.into() });
        self
    }

    pub fn with_section(mut self, name: impl Into<String>, table: toml::Table) -> Self {
        self.sections.insert(name.into(), toml::Value::Table(table));
        self
    }

    pub fn from_toml_str(input: &str) -> SagfsResult<Self> {
        toml::from_str(input).map_err(|e| SagfsError::Configuration(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> SagfsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SagfsError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the parameters every plugin needs, before any backend contact.
    pub fn validate(&self) -> SagfsResult<()> {
        if self.dataset_root.trim().is_empty() {
            return Err(SagfsError::Configuration(
                "dataset_root configuration is not given".into(),
            ));
        }
        Ok(())
    }

    /// Secrets with both fields present, or a configuration error.
    pub fn require_secrets(&self) -> SagfsResult<&Secrets> {
        let secrets = self
            .secrets
            .as_ref()
            .ok_or_else(|| SagfsError::Configuration("secrets are not given".into()))?;
        if secrets.user.is_empty() {
            return Err(SagfsError::Configuration("secrets.user is not given".into()));
        }
        if secrets.password.is_empty() {
            return Err(SagfsError::Configuration("secrets.password is not given".into()));
        }
        Ok(secrets)
    }

    /// Deserialize the backend table `name`.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> SagfsResult<T> {
        let value = self
            .sections
            .get(name)
            .cloned()
            .ok_or_else(|| SagfsError::Configuration(format!("[{}] configuration is not given", name)))?;
        value
            .try_into()
            .map_err(|e: toml::de::Error| SagfsError::Configuration(format!("[{}]: {}", name, e)))
    }
}
