//! `hostsync pull`: bring the local tree up to date with the store.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use super::{load_config, machine_id, orchestrator, print_refusal};

/// Arguments for `hostsync pull`.
#[derive(Args, Debug)]
pub struct PullArgs {}

impl PullArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = load_config()?;
        let self_id = machine_id(&config)?;
        let sync = orchestrator(&config);

        let (_, status) = sync
            .fetch_status(&self_id)
            .context("failed to resolve ownership status")?;
        if status.is_terminal() {
            print_refusal(status);
            return Ok(ExitCode::from(1));
        }

        let sets = sync.pull().context("pull failed")?;
        if sets.is_empty() {
            println!("✓ Local tree already up to date");
        } else {
            println!(
                "✓ Pulled ({} deleted, {} downloaded, {} updated)",
                sets.to_delete.len(),
                sets.to_upload.len(),
                sets.to_update.len(),
            );
        }
        Ok(ExitCode::SUCCESS)
    }
}
