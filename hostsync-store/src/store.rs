//! The remote object store interface.
//!
//! The store has no path API: objects are addressed by opaque id and found
//! by `(parent id, name)`. `None` as a parent means the store root.

use std::fmt;
use std::io::{Read, Write};

use crate::error::StoreError;

/// Opaque identifier of a remote object (file or folder).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(pub String);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Remote primitive being invoked; carried in errors and used for fault
/// injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreOp {
    FindChild,
    CreateFolder,
    Get,
    Put,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreOp::FindChild => "find-child",
            StoreOp::CreateFolder => "create-folder",
            StoreOp::Get => "get",
            StoreOp::Put => "put",
            StoreOp::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// One authenticated session against the remote store. Every call blocks
/// until the store answers.
pub trait ObjectStore {
    /// Id of the child called `name` under `parent`, if any.
    fn find_child(&self, parent: Option<&ObjectId>, name: &str)
        -> Result<Option<ObjectId>, StoreError>;

    /// Create a folder called `name` under `parent`.
    fn create_folder(&self, parent: Option<&ObjectId>, name: &str) -> Result<ObjectId, StoreError>;

    /// Stream the content of `id` into `sink`; returns the byte count.
    fn get(&self, id: &ObjectId, sink: &mut dyn Write) -> Result<u64, StoreError>;

    /// Create a file called `name` under `parent` from `source`.
    fn put(
        &self,
        parent: Option<&ObjectId>,
        name: &str,
        source: &mut dyn Read,
    ) -> Result<ObjectId, StoreError>;

    fn delete(&self, id: &ObjectId) -> Result<(), StoreError>;
}

/// Opens sessions for the pool.
pub trait SessionFactory: Send + Sync {
    type Session: ObjectStore + Send;

    fn connect(&self) -> Result<Self::Session, StoreError>;

    /// Drop any cached credentials so the next `connect` re-authenticates.
    fn reset_credentials(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
