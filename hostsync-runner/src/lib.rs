//! Composition root: identity, process supervision and the lifecycle
//! controller that ties the state record to the workload.

mod controller;
mod error;
pub mod identity;
mod logging;
pub mod supervisor;

pub use controller::{run_from_config, LifecycleController, Outcome};
pub use error::RunnerError;
pub use identity::{FixedIdentity, HostIdentity, IdentityProvider};
pub use logging::init_tracing;
pub use supervisor::{check_dependencies, CommandSupervisor, ProcessSupervisor};
