//! Domain types for hostsync.
//!
//! The state record and the manifest are the only two documents shared
//! through the remote store; both serialize to plain JSON objects.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque, stable identity of a machine. Ownership is compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(pub String);

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for MachineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MachineId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// State record
// ---------------------------------------------------------------------------

/// Persisted phase of the owner's most recent activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    Running,
    Updating,
    Stopped,
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleStatus::Running => "Running",
            LifecycleStatus::Updating => "Updating",
            LifecycleStatus::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}

/// The shared ownership record (`flags.json`).
///
/// Both fields absent is the virgin state of a store nobody has used yet.
/// Exactly one field present is corruption; see [`crate::status::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    #[serde(default)]
    pub owner: Option<MachineId>,
    #[serde(default)]
    pub lifecycle_status: Option<LifecycleStatus>,
}

impl StateRecord {
    /// Record claiming ownership for `owner` in phase `status`.
    pub fn claimed(owner: MachineId, status: LifecycleStatus) -> Self {
        Self {
            owner: Some(owner),
            lifecycle_status: Some(status),
        }
    }

    /// `true` when neither field has ever been written.
    pub fn is_virgin(&self) -> bool {
        self.owner.is_none() && self.lifecycle_status.is_none()
    }
}

// ---------------------------------------------------------------------------
// Manifests and diff sets
// ---------------------------------------------------------------------------

/// Root-relative, forward-slash path → content hash.
pub type Manifest = BTreeMap<String, String>;

/// Reconciliation actions computed by the diff engine.
///
/// The three maps are pairwise disjoint by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSets {
    pub to_delete: Manifest,
    pub to_upload: Manifest,
    pub to_update: Manifest,
}

impl DiffSets {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_upload.is_empty() && self.to_update.is_empty()
    }

    /// Total number of paths that need an action.
    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_upload.len() + self.to_update.len()
    }
}

// ---------------------------------------------------------------------------
// Runtime status
// ---------------------------------------------------------------------------

/// Status derived fresh on every run; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeStatus {
    UpToDate,
    Outdated,
    StoppedCorruptly,
    UploadedCorruptly,
    Running,
    AlreadyRunningElsewhere,
    Updating,
    AlreadyUpdatingElsewhere,
    Starting,
    Uploading,
    Synchronized,
    Stopped,
}

impl RuntimeStatus {
    /// Statuses that forbid this machine from starting the workload.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RuntimeStatus::AlreadyRunningElsewhere
                | RuntimeStatus::AlreadyUpdatingElsewhere
                | RuntimeStatus::Running
        )
    }

    /// The local tree is stale and must be pulled before starting.
    pub fn requires_pull(self) -> bool {
        self == RuntimeStatus::Outdated
    }

    /// A previous push from this machine crashed part-way through.
    pub fn is_interrupted_upload(self) -> bool {
        self == RuntimeStatus::UploadedCorruptly
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuntimeStatus::UpToDate => "UpToDate",
            RuntimeStatus::Outdated => "Outdated",
            RuntimeStatus::StoppedCorruptly => "StoppedCorruptly",
            RuntimeStatus::UploadedCorruptly => "UploadedCorruptly",
            RuntimeStatus::Running => "Running",
            RuntimeStatus::AlreadyRunningElsewhere => "AlreadyRunningElsewhere",
            RuntimeStatus::Updating => "Updating",
            RuntimeStatus::AlreadyUpdatingElsewhere => "AlreadyUpdatingElsewhere",
            RuntimeStatus::Starting => "Starting",
            RuntimeStatus::Uploading => "Uploading",
            RuntimeStatus::Synchronized => "Synchronized",
            RuntimeStatus::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_record_uses_camel_case_keys() {
        let record = StateRecord::claimed(MachineId::from("pc-1"), LifecycleStatus::Updating);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"owner":"pc-1","lifecycleStatus":"Updating"}"#);
    }

    #[test]
    fn empty_object_is_virgin_record() {
        let record: StateRecord = serde_json::from_str("{}").unwrap();
        assert!(record.is_virgin());
    }

    #[test]
    fn explicit_nulls_are_virgin_record() {
        let record: StateRecord =
            serde_json::from_str(r#"{"owner":null,"lifecycleStatus":null}"#).unwrap();
        assert!(record.is_virgin());
    }

    #[test]
    fn unknown_lifecycle_status_is_rejected() {
        let err = serde_json::from_str::<StateRecord>(r#"{"owner":"a","lifecycleStatus":"Paused"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(RuntimeStatus::AlreadyRunningElsewhere.is_terminal());
        assert!(RuntimeStatus::AlreadyUpdatingElsewhere.is_terminal());
        assert!(RuntimeStatus::Running.is_terminal());
        assert!(!RuntimeStatus::Outdated.is_terminal());
        assert!(!RuntimeStatus::StoppedCorruptly.is_terminal());
        assert!(!RuntimeStatus::UploadedCorruptly.is_terminal());
    }

    #[test]
    fn diff_sets_len_counts_all_actions() {
        let mut sets = DiffSets::default();
        assert!(sets.is_empty());
        sets.to_delete.insert("a".into(), "1".into());
        sets.to_update.insert("b".into(), "2".into());
        assert_eq!(sets.len(), 2);
        assert!(!sets.is_empty());
    }
}
