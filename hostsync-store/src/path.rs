//! Path → id resolution over a store that only answers "child by name".
//!
//! Both walks are iterative: one `find_child` per segment, root to leaf.

use hostsync_core::paths;

use crate::error::StoreError;
use crate::store::{ObjectId, ObjectStore};

/// Id of the object at `key`, or `None` if any segment is missing.
///
/// The empty key names the store root, which has no id and resolves to
/// `None` as well.
pub fn resolve_id<S>(store: &S, key: &str) -> Result<Option<ObjectId>, StoreError>
where
    S: ObjectStore + ?Sized,
{
    let mut current: Option<ObjectId> = None;
    for segment in paths::segments(key) {
        match store.find_child(current.as_ref(), segment)? {
            Some(id) => current = Some(id),
            None => return Ok(None),
        }
    }
    Ok(current)
}

/// Result of [`create_folder_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderOutcome {
    /// Id of the deepest folder; `None` for the store root.
    pub id: Option<ObjectId>,
    /// Whether any segment had to be created.
    pub created: bool,
}

/// Ensure every segment of `key` exists as a folder.
///
/// Idempotent: existing segments are reused, missing ones created in order.
pub fn create_folder_all<S>(store: &S, key: &str) -> Result<FolderOutcome, StoreError>
where
    S: ObjectStore + ?Sized,
{
    let mut current: Option<ObjectId> = None;
    let mut created = false;
    for segment in paths::segments(key) {
        let next = match store.find_child(current.as_ref(), segment)? {
            Some(id) => id,
            None => {
                created = true;
                store.create_folder(current.as_ref(), segment)?
            }
        };
        current = Some(next);
    }
    Ok(FolderOutcome {
        id: current,
        created,
    })
}
