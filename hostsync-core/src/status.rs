//! Ownership status resolver.
//!
//! Maps `(this machine, shared state record)` to a [`RuntimeStatus`]:
//!
//! | lifecycleStatus | owner == self | status                     |
//! |-----------------|---------------|----------------------------|
//! | (none)          | (none)        | `UpToDate` (virgin store)  |
//! | `Running`       | yes           | `StoppedCorruptly`         |
//! | `Running`       | no            | `AlreadyRunningElsewhere`  |
//! | `Stopped`       | yes           | `UpToDate`                 |
//! | `Stopped`       | no            | `Outdated`                 |
//! | `Updating`      | yes           | `UploadedCorruptly`        |
//! | `Updating`      | no            | `AlreadyUpdatingElsewhere` |
//!
//! Any other combination is [`StateError::Corrupted`].

use crate::error::StateError;
use crate::types::{LifecycleStatus, MachineId, RuntimeStatus, StateRecord};

/// Resolve the runtime status of `self_id` against `record`.
pub fn resolve(self_id: &MachineId, record: &StateRecord) -> Result<RuntimeStatus, StateError> {
    if record.is_virgin() {
        return Ok(RuntimeStatus::UpToDate);
    }

    let (owner, status) = match (&record.owner, record.lifecycle_status) {
        (Some(owner), Some(status)) if !owner.0.is_empty() => (owner, status),
        _ => {
            return Err(StateError::Corrupted {
                owner: record.owner.as_ref().map(|o| o.0.clone()),
                lifecycle_status: record.lifecycle_status,
            })
        }
    };

    let mine = owner == self_id;
    Ok(match (status, mine) {
        (LifecycleStatus::Running, true) => RuntimeStatus::StoppedCorruptly,
        (LifecycleStatus::Running, false) => RuntimeStatus::AlreadyRunningElsewhere,
        (LifecycleStatus::Stopped, true) => RuntimeStatus::UpToDate,
        (LifecycleStatus::Stopped, false) => RuntimeStatus::Outdated,
        (LifecycleStatus::Updating, true) => RuntimeStatus::UploadedCorruptly,
        (LifecycleStatus::Updating, false) => RuntimeStatus::AlreadyUpdatingElsewhere,
    })
}
