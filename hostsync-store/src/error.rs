//! Error types for hostsync-store.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreOp;

/// All errors that can arise from remote store access.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A remote call failed. Assumed transient.
    #[error("{op} failed for '{path}': {message}")]
    Transfer {
        op: StoreOp,
        path: String,
        message: String,
    },

    /// The addressed remote object does not exist.
    #[error("remote object not found: '{path}'")]
    NotFound { path: String },

    /// A session could not be established.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// A key that would resolve outside the store (`..`, absolute paths).
    #[error("invalid remote key: '{key}'")]
    InvalidKey { key: String },

    /// Local I/O failure on this machine's side of a transfer (the file
    /// being uploaded, the download destination).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Classifies errors the [`crate::Retrier`] may retry.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Only failures of the remote side are retried. Local I/O, rejected
/// credentials and unsafe keys fail the same way on every attempt.
impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transfer { .. } | StoreError::NotFound { .. })
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`StoreError::Transfer`].
pub(crate) fn transfer_err(op: StoreOp, path: impl Into<String>, message: impl ToString) -> StoreError {
    StoreError::Transfer {
        op,
        path: path.into(),
        message: message.to_string(),
    }
}
