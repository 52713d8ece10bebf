// Core infrastructure modules
pub mod core;

pub mod model;
pub mod decoration; // Input decorator pipeline
pub mod coord;      // Parallel multi-target execution
pub mod peer;       // Peer collaborators and the support facade

// Re-exports for convenience
pub use crate::core::config::{AggregationMode, CoordinatorConfig, CONFIG_BLOCK_MARKER};
pub use crate::core::errors::{EndorserError, Result};
pub use coord::{
    BackendRef, BatchResult, Coordinator, ExecutionBackend, ExecutionHook, TargetSelector,
    TaskEvent, TaskOutcome,
};
pub use decoration::{Decorator, DecoratorRegistry};
pub use model::*;
pub use peer::{ExecutionRequest, Support, SupportBuilder};
