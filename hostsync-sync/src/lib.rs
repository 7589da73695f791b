//! # hostsync-sync
//!
//! Local hashing, manifest diffing and pull/push reconciliation.
//!
//! Build an [`Orchestrator`] from the loaded config and a store factory,
//! then call [`Orchestrator::pull`] or [`Orchestrator::push`]. The shared
//! state record is read and written through the same orchestrator
//! ([`Orchestrator::fetch_flags`], [`Orchestrator::commit_flags`]).

pub mod diff;
pub mod error;
pub mod flags;
pub mod index;
pub mod local;
pub mod orchestrator;
pub mod parallel;

pub use diff::{diff, plan, SyncDirection};
pub use error::SyncError;
pub use index::PathFilter;
pub use orchestrator::{Orchestrator, PushReport};
