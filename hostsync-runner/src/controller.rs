//! Lifecycle controller: one run of the ownership protocol.
//!
//! ```text
//! fetch flags → resolve → (refuse | pull if Outdated) → Running
//!   → workload → Updating → push → Stopped
//! ```
//!
//! Every phase boundary commits the state record before the next phase
//! starts, so a crash anywhere leaves a record that the next run resolves
//! to `StoppedCorruptly` or `UploadedCorruptly`.

use hostsync_core::{
    Config, LifecycleStatus, MachineId, ProcessConfig, RuntimeStatus, StateRecord, WorkloadConfig,
};
use hostsync_store::{DirStore, SessionFactory};
use hostsync_sync::{Orchestrator, PushReport};

use crate::error::RunnerError;
use crate::identity;
use crate::supervisor::{check_dependencies, CommandSupervisor, ProcessSupervisor};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ownership is held by another machine; nothing was touched.
    Refused { status: RuntimeStatus },
    /// The workload ran and its changes were pushed.
    Completed {
        status: RuntimeStatus,
        report: PushReport,
    },
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Refused { .. } => 1,
            Outcome::Completed { .. } => 0,
        }
    }
}

pub struct LifecycleController<F: SessionFactory, P: ProcessSupervisor> {
    sync: Orchestrator<F>,
    self_id: MachineId,
    supervisor: P,
    workload: Option<WorkloadConfig>,
    tunnel: Option<ProcessConfig>,
}

impl<F: SessionFactory, P: ProcessSupervisor> LifecycleController<F, P> {
    pub fn new(sync: Orchestrator<F>, self_id: MachineId, supervisor: P) -> Self {
        Self {
            sync,
            self_id,
            supervisor,
            workload: None,
            tunnel: None,
        }
    }

    pub fn with_workload(mut self, workload: Option<WorkloadConfig>) -> Self {
        self.workload = workload;
        self
    }

    pub fn with_tunnel(mut self, tunnel: Option<ProcessConfig>) -> Self {
        self.tunnel = tunnel;
        self
    }

    pub fn sync(&self) -> &Orchestrator<F> {
        &self.sync
    }

    pub fn supervisor(&self) -> &P {
        &self.supervisor
    }

    pub fn run(&mut self) -> Result<Outcome, RunnerError> {
        let (_, status) = self.sync.fetch_status(&self.self_id)?;
        tracing::info!(target: "state", %status, machine = %self.self_id, "resolved status");

        if status.is_terminal() {
            tracing::error!(target: "state", %status, "ownership is held elsewhere, exiting");
            return Ok(Outcome::Refused { status });
        }

        if let Some(workload) = &self.workload {
            if let Err(err) = check_dependencies(&workload.required, self.sync.root()) {
                tracing::error!(target: "local", error = %err, "cannot start workload");
                return Err(err);
            }
        }

        if status.requires_pull() {
            self.sync.pull()?;
        }

        self.mark(LifecycleStatus::Running)?;
        self.run_workload()?;

        self.mark(LifecycleStatus::Updating)?;
        let report = self.sync.push(status.is_interrupted_upload())?;

        self.mark(LifecycleStatus::Stopped)?;
        Ok(Outcome::Completed { status, report })
    }

    fn run_workload(&mut self) -> Result<(), RunnerError> {
        log_status(RuntimeStatus::Starting);
        let root = self.sync.root().to_path_buf();
        match &self.workload {
            Some(workload) => {
                let process = ProcessConfig {
                    command: workload.command.clone(),
                    args: workload.args.clone(),
                };
                self.supervisor.start(&process, &root)?;
            }
            None => tracing::warn!(target: "state", "no workload configured"),
        }
        if let Some(tunnel) = &self.tunnel {
            self.supervisor.start(tunnel, &root)?;
        }
        log_status(RuntimeStatus::Running);

        self.supervisor.wait_all()?;
        log_status(RuntimeStatus::Stopped);
        Ok(())
    }

    fn mark(&self, lifecycle_status: LifecycleStatus) -> Result<(), RunnerError> {
        let record = StateRecord::claimed(self.self_id.clone(), lifecycle_status);
        self.sync.commit_flags(&record)?;
        Ok(())
    }
}

fn log_status(status: RuntimeStatus) {
    tracing::info!(target: "state", %status, "status");
}

/// Run one lifecycle against the directory-backed store named in `config`.
pub fn run_from_config(config: &Config) -> Result<Outcome, RunnerError> {
    let self_id = identity::from_config(config).machine_id()?;
    let sync = Orchestrator::from_config(config, DirStore::new(&config.store_root));
    LifecycleController::new(sync, self_id, CommandSupervisor::new())
        .with_workload(config.workload.clone())
        .with_tunnel(config.tunnel.clone())
        .run()
}
