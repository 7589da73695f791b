//! Hostsync core library: domain types, ownership status, configuration.
//!
//! Public API surface:
//! - [`types`]: state record, manifests, runtime status
//! - [`status`]: the ownership status resolver
//! - [`config`]: YAML configuration load / save / init
//! - [`paths`]: fixed file locations and path-key normalisation
//! - [`error`]: [`ConfigError`], [`StateError`]

pub mod config;
pub mod error;
pub mod paths;
pub mod status;
pub mod types;

pub use config::{Config, ProcessConfig, RetrySettings, WorkloadConfig};
pub use error::{ConfigError, StateError};
pub use status::resolve;
pub use types::{DiffSets, LifecycleStatus, MachineId, Manifest, RuntimeStatus, StateRecord};
