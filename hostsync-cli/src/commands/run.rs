//! `hostsync run`: one full ownership lifecycle.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use hostsync_runner::{run_from_config, Outcome, RunnerError};

use super::{load_config, print_refusal};

/// Arguments for `hostsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = load_config()?;

        match run_from_config(&config) {
            Ok(outcome) => {
                match &outcome {
                    Outcome::Refused { status } => print_refusal(*status),
                    Outcome::Completed { status, report } => {
                        println!(
                            "✓ Done (started as {status}; {} deleted, {} uploaded, {} updated, {} skipped)",
                            report.sets.to_delete.len(),
                            report.sets.to_upload.len() - report.skipped,
                            report.sets.to_update.len(),
                            report.skipped,
                        );
                    }
                }
                Ok(ExitCode::from(outcome.exit_code()))
            }
            Err(RunnerError::DependencyMissing { path }) => {
                eprintln!(
                    "{} required dependency missing: {}",
                    "✗".red().bold(),
                    path.display()
                );
                Ok(ExitCode::from(1))
            }
            Err(err) => Err(err.into()),
        }
    }
}
