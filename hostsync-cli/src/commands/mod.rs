pub mod diff;
pub mod init;
pub mod pull;
pub mod push;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use colored::Colorize;

use hostsync_core::{config, Config, MachineId, RuntimeStatus};
use hostsync_runner::identity;
use hostsync_store::DirStore;
use hostsync_sync::Orchestrator;

/// Load the config, pointing at `hostsync init` when there is none.
pub(crate) fn load_config() -> Result<Config> {
    config::load().context("failed to load config")
}

pub(crate) fn orchestrator(config: &Config) -> Orchestrator<DirStore> {
    Orchestrator::from_config(config, DirStore::new(&config.store_root))
}

pub(crate) fn machine_id(config: &Config) -> Result<MachineId> {
    identity::from_config(config)
        .machine_id()
        .context("could not determine machine identity")
}

/// Print the refusal line for a status that forbids touching the store.
pub(crate) fn print_refusal(status: RuntimeStatus) {
    eprintln!(
        "{} {}: another machine holds the workload",
        "✗".red().bold(),
        status.to_string().bold()
    );
}
