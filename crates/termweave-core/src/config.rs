//! # Store Configuration
//!
//! Selects and opens the entity store a session commits to.
//!
//! ```toml
//! [store]
//! backend = "redb"            # or "ephemeral" (default)
//! path = "termweave.redb"     # required for redb
//! ```
//!
//! ## Environment Overrides
//!
//! - `TERMWEAVE_STORE_BACKEND`: `ephemeral` or `redb`
//! - `TERMWEAVE_STORE_PATH`: database path for the redb backend

use crate::StoreError;
use crate::storage::{EphemeralStore, RedbStore, StoreBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_STORE_BACKEND: &str = "TERMWEAVE_STORE_BACKEND";
pub const ENV_STORE_PATH: &str = "TERMWEAVE_STORE_PATH";

/// Which store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ephemeral,
    Redb,
}

impl std::str::FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ephemeral" => Ok(Self::Ephemeral),
            "redb" => Ok(Self::Redb),
            other => Err(StoreError::Config(format!(
                "unknown store backend '{}' (expected 'ephemeral' or 'redb')",
                other
            ))),
        }
    }
}

/// Store selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    store: StoreConfig,
}

impl StoreConfig {
    /// Configuration for an in-memory store.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Configuration for a redb store at `path`.
    #[must_use]
    pub fn redb(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Redb,
            path: Some(path.into()),
        }
    }

    /// Parse the `[store]` table of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(file.store)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::Config(format!(
                "cannot read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `TERMWEAVE_STORE_*` environment overrides.
    pub fn apply_env(self) -> Result<Self, StoreError> {
        let backend = std::env::var(ENV_STORE_BACKEND).ok();
        let path = std::env::var(ENV_STORE_PATH).ok();
        self.apply_overrides(backend.as_deref(), path.as_deref())
    }

    /// Apply explicit overrides; `None` keeps the current value.
    pub fn apply_overrides(
        mut self,
        backend: Option<&str>,
        path: Option<&str>,
    ) -> Result<Self, StoreError> {
        if let Some(backend) = backend {
            self.backend = backend.parse()?;
        }
        if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) {
            self.path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// Open the configured store.
    pub fn open(&self) -> Result<StoreBackend, StoreError> {
        match self.backend {
            BackendKind::Ephemeral => {
                tracing::info!("using ephemeral store");
                Ok(StoreBackend::Ephemeral(EphemeralStore::new()))
            }
            BackendKind::Redb => {
                let path = self.path.as_ref().ok_or_else(|| {
                    StoreError::Config("redb backend requires a store path".to_string())
                })?;
                tracing::info!(path = %path.display(), "using redb store");
                Ok(StoreBackend::Redb(RedbStore::open(path)?))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
