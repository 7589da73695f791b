//! `hostsync init <root> --store <dir> [...]`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use hostsync_core::{config, Config, WorkloadConfig};

/// Write the config for a local tree and a shared store.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Local directory tree to keep in sync.
    pub root: PathBuf,

    /// Directory (usually a mounted share) used as the shared store.
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Exclude every path containing this substring (case-insensitive).
    #[arg(long = "filter", value_name = "SUBSTRING")]
    pub filters: Vec<String>,

    /// Maximum parallel hashing and transfer tasks.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Command that runs the workload, started in <root>.
    #[arg(long, value_name = "CMD")]
    pub workload: Option<String>,

    /// Argument passed to the workload (repeatable).
    #[arg(long = "arg", value_name = "ARG", requires = "workload", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Path that must exist before the workload may start (repeatable).
    #[arg(long = "require", value_name = "PATH", requires = "workload")]
    pub required: Vec<PathBuf>,

    /// Use this identity instead of the detected machine id.
    #[arg(long)]
    pub machine_id: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<ExitCode> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("cannot resolve root '{}'", self.root.display()))?;
        let store = self
            .store
            .canonicalize()
            .with_context(|| format!("cannot resolve store '{}'", self.store.display()))?;

        let mut config = Config::new(root.clone(), store.clone());
        for filter in self.filters {
            if !config.filters.iter().any(|f| f.eq_ignore_ascii_case(&filter)) {
                config.filters.push(filter);
            }
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.max(1);
        }
        config.workload = self.workload.map(|command| WorkloadConfig {
            command,
            args: self.args,
            required: self.required,
        });
        config.machine_id = self.machine_id;

        let saved = config::init(config).context("failed to write config")?;
        if saved.root != root || saved.store_root != store {
            println!(
                "✓ Already initialized for '{}' (store '{}'); config left unchanged",
                saved.root.display(),
                saved.store_root.display()
            );
        } else {
            println!("✓ Initialized '{}'", root.display());
            println!("  Store:    {}", store.display());
        }
        println!("  Saved to: ~/.hostsync/config.yaml");
        Ok(ExitCode::SUCCESS)
    }
}
