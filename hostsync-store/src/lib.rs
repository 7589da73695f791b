//! # hostsync-store
//!
//! Pooled, retrying access to a remote object store that only knows
//! "child by name under parent id".
//!
//! - [`store`]: the [`ObjectStore`] / [`SessionFactory`] interface
//! - [`path`]: iterative path → id resolution, idempotent folder creation
//! - [`pool`]: TTL-bounded session pool
//! - [`retry`]: the [`Retrier`]
//! - [`remote`]: [`RemoteFiles`], file-level operations over a pool
//! - [`memory`] / [`dir`]: concrete backends

pub mod dir;
pub mod error;
pub mod memory;
pub mod path;
pub mod pool;
pub mod progress;
pub mod remote;
pub mod retry;
pub mod store;

pub use dir::DirStore;
pub use error::{StoreError, Transient};
pub use memory::MemoryStore;
pub use pool::{PooledSession, SessionPool};
pub use progress::{Direction, TransferStats};
pub use remote::{RemoteFiles, UploadOutcome};
pub use retry::{Retrier, RetryPolicy};
pub use store::{ObjectId, ObjectStore, SessionFactory, StoreOp};
