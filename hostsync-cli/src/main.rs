//! Hostsync: share one workload between machines through a common store.
//!
//! # Usage
//!
//! ```text
//! hostsync init <root> --store <dir> [--filter <s>]... [--concurrency n]
//!               [--workload <cmd>] [--arg <a>]... [--require <path>]...
//! hostsync run
//! hostsync status [--json]
//! hostsync diff [--pull]
//! hostsync push [--resume]
//! hostsync pull
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, init::InitArgs, pull::PullArgs, push::PushArgs, run::RunArgs,
    status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hostsync",
    version,
    about = "Keep a workload's files in sync across machines and run it on one at a time",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write ~/.hostsync/config.yaml for a local tree and a shared store.
    Init(InitArgs),

    /// Claim ownership, run the workload, then publish its changes.
    Run(RunArgs),

    /// Show who owns the workload and what that means for this machine.
    Status(StatusArgs),

    /// Show what a push (or pull) would transfer.
    Diff(DiffArgs),

    /// Upload local changes to the store.
    Push(PushArgs),

    /// Download remote changes into the local tree.
    Pull(PullArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    hostsync_runner::init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Run(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Push(args) => args.run(),
        Commands::Pull(args) => args.run(),
    }
}
