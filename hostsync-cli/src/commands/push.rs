//! `hostsync push`: upload local changes without running the workload.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use super::{load_config, machine_id, orchestrator, print_refusal};

/// Arguments for `hostsync push`.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Skip uploads whose target already exists remotely. Implied when the
    /// last push from this machine was interrupted.
    #[arg(long)]
    pub resume: bool,
}

impl PushArgs {
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

        let resume = self.resume || status.is_interrupted_upload();
        let report = sync.push(resume).context("push failed")?;
        if report.sets.is_empty() {
            println!("✓ Remote already up to date");
        } else {
            println!(
                "✓ Pushed ({} deleted, {} uploaded, {} updated, {} skipped)",
                report.sets.to_delete.len(),
                report.sets.to_upload.len() - report.skipped,
                report.sets.to_update.len(),
                report.skipped,
            );
        }
        Ok(ExitCode::SUCCESS)
    }
}
