//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.hostsync/
//!   config.yaml   (mode 0600; directory mode 0700)
//! ```
//!
//! # API pattern
//!
//! Every function touching the config file has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::STATE_DIR;

pub const DEFAULT_CONCURRENCY: usize = 24;
/// Pooled sessions are discarded after 58 minutes, ahead of the one hour
/// lifetime of a typical access token.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 58 * 60;

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// A supervised external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// The long-lived workload whose ownership is arbitrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Paths that must exist before the workload may start (runtimes,
    /// server jars, …). Relative paths are resolved against the root.
    #[serde(default)]
    pub required: Vec<PathBuf>,
}

/// Retry behaviour for remote store calls.
///
/// The default retries forever without delay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Local tree kept in sync.
    pub root: PathBuf,
    /// Root of the directory-backed remote store.
    pub store_root: PathBuf,
    /// Case-insensitive path fragments excluded from hashing and mirroring.
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Overrides the detected machine identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<WorkloadConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<ProcessConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_filters() -> Vec<String> {
    vec![STATE_DIR.to_string()]
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

impl Config {
    pub fn new(root: PathBuf, store_root: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            root,
            store_root,
            filters: default_filters(),
            concurrency: DEFAULT_CONCURRENCY,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            retry: RetrySettings::default(),
            machine_id: None,
            workload: None,
            tunnel: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Configured filters plus the state directory, which is never synced
    /// as ordinary content.
    pub fn effective_filters(&self) -> Vec<String> {
        let mut filters = self.filters.clone();
        if !filters.iter().any(|f| f.eq_ignore_ascii_case(STATE_DIR)) {
            filters.push(STATE_DIR.to_string());
        }
        filters
    }

    /// Worker fan-out; never zero.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.hostsync/`. Pure, no I/O.
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(STATE_DIR)
}

/// `<home>/.hostsync/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load `<home>/.hostsync/config.yaml`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the config.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// 5. Init
// ---------------------------------------------------------------------------

/// Write `config` unless a config already exists.
///
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_at(home: &Path, config: Config) -> Result<Config, ConfigError> {
    if config_path_at(home).exists() {
        return load_at(home);
    }
    save_at(home, &config)?;
    Ok(config)
}

/// `init_at` convenience wrapper.
pub fn init(config: Config) -> Result<Config, ConfigError> {
    init_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
