//! Error types for hostsync-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::LifecycleStatus;

/// All errors that can arise from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.hostsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; run `hostsync init` first")]
    ConfigNotFound { path: PathBuf },
}

/// Errors raised while interpreting the shared ownership record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Exactly one of `owner` / `lifecycleStatus` is set (or the owner is
    /// empty). Never repaired automatically.
    #[error("state record is corrupted (owner: {owner:?}, lifecycleStatus: {lifecycle_status:?})")]
    Corrupted {
        owner: Option<String>,
        lifecycle_status: Option<LifecycleStatus>,
    },
}
