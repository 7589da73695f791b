//! `hostsync diff [--pull]`: show what a reconciliation would transfer.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use hostsync_core::Manifest;
use hostsync_sync::SyncDirection;

use super::{load_config, orchestrator};

/// Arguments for `hostsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Diff in the pull direction (remote → local) instead of push.
    #[arg(long)]
    pub pull: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = load_config()?;
        let direction = if self.pull {
            SyncDirection::Pull
        } else {
            SyncDirection::Push
        };

        let sets = orchestrator(&config)
            .plan(direction)
            .context("failed to compute diff")?;

        if sets.is_empty() {
            println!("Nothing to sync.");
            return Ok(ExitCode::SUCCESS);
        }

        let (delete, add) = match direction {
            SyncDirection::Push => ("delete remotely", "upload"),
            SyncDirection::Pull => ("delete locally", "download"),
        };
        print_set('-', delete, &sets.to_delete);
        print_set('+', add, &sets.to_upload);
        print_set('~', "update", &sets.to_update);
        println!("{} paths differ", sets.len());
        Ok(ExitCode::SUCCESS)
    }
}

fn print_set(marker: char, label: &str, set: &Manifest) {
    if set.is_empty() {
        return;
    }
    println!("{label} ({}):", set.len());
    for key in set.keys() {
        println!("  {marker} {key}");
    }
}
