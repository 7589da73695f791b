//! Machine identity.
//!
//! The id only has to be stable per machine and distinct across machines
//! sharing a store; it is compared by value and never parsed.

use std::path::PathBuf;
use std::process::Command;

use hostsync_core::{Config, MachineId};

use crate::error::RunnerError;

pub trait IdentityProvider {
    fn machine_id(&self) -> Result<MachineId, RunnerError>;
}

/// Always returns the same id. Used for the `machine_id` config override.
#[derive(Debug, Clone)]
pub struct FixedIdentity(MachineId);

impl FixedIdentity {
    pub fn new(id: impl Into<MachineId>) -> Self {
        Self(id.into())
    }
}

impl IdentityProvider for FixedIdentity {
    fn machine_id(&self) -> Result<MachineId, RunnerError> {
        Ok(self.0.clone())
    }
}

/// The first readable machine-id file; the host name only when no such
/// file exists.
#[derive(Debug, Clone)]
pub struct HostIdentity {
    id_files: Vec<PathBuf>,
}

impl Default for HostIdentity {
    fn default() -> Self {
        Self {
            id_files: vec![
                PathBuf::from("/etc/machine-id"),
                PathBuf::from("/var/lib/dbus/machine-id"),
            ],
        }
    }
}

impl HostIdentity {
    pub fn with_id_files(id_files: Vec<PathBuf>) -> Self {
        Self { id_files }
    }

    fn machine_id_file(&self) -> Option<String> {
        self.id_files.iter().find_map(|path| {
            let contents = std::fs::read_to_string(path).ok()?;
            let trimmed = contents.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
    }
}

impl IdentityProvider for HostIdentity {
    fn machine_id(&self) -> Result<MachineId, RunnerError> {
        self.machine_id_file()
            .or_else(host_name)
            .map(MachineId)
            .ok_or_else(|| {
                RunnerError::Identity("no readable machine-id file and no host name".to_string())
            })
    }
}

/// The `hostname` command's output, or the environment when the command is
/// unavailable.
fn host_name() -> Option<String> {
    host_name_command().or_else(|| {
        ["HOSTNAME", "COMPUTERNAME"]
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn host_name_command() -> Option<String> {
    let output = Command::new("hostname").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// The configured override, or the host identity.
pub fn from_config(config: &Config) -> Box<dyn IdentityProvider> {
    match config.machine_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(id) => Box::new(FixedIdentity::new(id.trim())),
        None => Box::new(HostIdentity::default()),
    }
}
