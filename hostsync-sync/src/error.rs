//! Error types for hostsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use hostsync_core::StateError;
use hostsync_store::StoreError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The shared state record is corrupted.
    #[error(transparent)]
    State(#[from] StateError),

    /// A remote store call failed and was not recovered by retrying.
    #[error("transfer failed: {0}")]
    Store(#[from] StoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local JSON document could not be parsed or encoded.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Walking the local tree failed.
    #[error("failed to walk local tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Json`].
pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> SyncError {
    SyncError::Json {
        path: path.into(),
        source,
    }
}
