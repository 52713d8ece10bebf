// Core infrastructure shared by the coordinator and the peer facade

pub mod config;
pub mod errors;

// Re-export commonly used types
pub use config::{AggregationMode, CoordinatorConfig, CoordinatorConfigBuilder};
pub use errors::{EndorserError, Result};
