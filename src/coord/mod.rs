//! Parallel multi-target execution
//!
//! Routes each chaincode input of a batch to its backend, runs all of them
//! concurrently and folds the outcomes into one batch result.

pub mod aggregate;
pub mod backend;
pub mod coordinator;
pub mod hooks;
pub mod router;
pub mod types;

pub use aggregate::Aggregator;
pub use backend::{BackendRef, ChaincodeLifecycle, ExecutionBackend};
pub use coordinator::Coordinator;
pub use hooks::{CompositeHook, ExecutionHook, HookContext, LoggingHook};
pub use router::{Assignment, TargetSelector};
pub use types::{BatchResult, TaskEvent, TaskOutcome};
