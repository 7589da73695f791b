use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the lifecycle controller and its collaborators.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("sync error: {0}")]
    Sync(#[from] hostsync_sync::SyncError),

    #[error("config error: {0}")]
    Config(#[from] hostsync_core::ConfigError),

    #[error("required dependency missing: {path}")]
    DependencyMissing { path: PathBuf },

    #[error("failed to run `{command}`: {source}")]
    Process {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine machine identity: {0}")]
    Identity(String),
}

pub(crate) fn process_err(command: impl Into<String>, source: std::io::Error) -> RunnerError {
    RunnerError::Process {
        command: command.into(),
        source,
    }
}
