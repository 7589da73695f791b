//! `hostsync status`: resolve the shared state record for this machine.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use hostsync_core::{LifecycleStatus, MachineId, RuntimeStatus};

use super::{load_config, machine_id, orchestrator};

/// Arguments for `hostsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    status: RuntimeStatus,
    owner: Option<MachineId>,
    lifecycle_status: Option<LifecycleStatus>,
    machine_id: MachineId,
    owned_by_me: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = load_config()?;
        let self_id = machine_id(&config)?;
        let sync = orchestrator(&config);

        let (record, status) = sync
            .fetch_status(&self_id)
            .context("failed to resolve ownership status")?;
        let owned_by_me = record.owner.as_ref() == Some(&self_id);

        if self.json {
            let payload = StatusJson {
                status,
                owner: record.owner,
                lifecycle_status: record.lifecycle_status,
                machine_id: self_id,
                owned_by_me,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(ExitCode::SUCCESS);
        }

        println!("Hostsync v{} | {}", env!("CARGO_PKG_VERSION"), config.root.display());
        println!("  status:  {}", colorize(status));
        match (&record.owner, record.lifecycle_status) {
            (Some(owner), Some(phase)) => {
                let mine = if owned_by_me { " (this machine)" } else { "" };
                println!("  owner:   {owner}{mine}");
                println!("  phase:   {phase}");
            }
            _ => println!("  owner:   none"),
        }
        println!("  machine: {self_id}");
        Ok(ExitCode::SUCCESS)
    }
}

fn colorize(status: RuntimeStatus) -> String {
    let label = status.to_string();
    if status.is_terminal() {
        label.red().bold().to_string()
    } else if status.requires_pull() {
        label.yellow().bold().to_string()
    } else {
        label.green().bold().to_string()
    }
}
