//! The shared state record (`flags.json`).
//!
//! Every mutation is written locally first, then pushed.

use hostsync_core::{paths, status, MachineId, RuntimeStatus, StateRecord};
use hostsync_store::SessionFactory;

use crate::error::SyncError;
use crate::local;
use crate::orchestrator::Orchestrator;

impl<F: SessionFactory> Orchestrator<F> {
    /// Download the remote state record. A store that has never been used
    /// yields the virgin record.
    pub fn fetch_flags(&self) -> Result<StateRecord, SyncError> {
        let path = paths::local_flags_path(self.root());
        self.fetch_document(&paths::remote_flags_key(), &path)?;
        let record: StateRecord = local::load_json(&path)?.unwrap_or_default();
        tracing::debug!(
            target: "state",
            owner = ?record.owner,
            lifecycle_status = ?record.lifecycle_status,
            "fetched state record"
        );
        Ok(record)
    }

    /// Fetch the state record and resolve it for `self_id`.
    pub fn fetch_status(&self, self_id: &MachineId) -> Result<(StateRecord, RuntimeStatus), SyncError> {
        let record = self.fetch_flags()?;
        let status = status::resolve(self_id, &record)?;
        Ok((record, status))
    }

    /// Persist `record` locally, then overwrite the remote copy.
    pub fn commit_flags(&self, record: &StateRecord) -> Result<(), SyncError> {
        let path = paths::local_flags_path(self.root());
        local::save_json(&path, record)?;
        self.publish_document(&path, &paths::remote_flags_key())?;
        tracing::info!(
            target: "state",
            owner = ?record.owner,
            lifecycle_status = ?record.lifecycle_status,
            "state record committed"
        );
        Ok(())
    }
}
