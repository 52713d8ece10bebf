use crate::core::errors::{EndorserError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// First argument that marks an input as a configuration-block fetch
pub const CONFIG_BLOCK_MARKER: &str = "GetConfigBlock";

/// System chaincodes whose version is not qualified with the container tag
pub const DEFAULT_SYSTEM_CHAINCODES: [&str; 2] = ["cscc", "lscc"];

/// How per-task outcomes are folded into the batch response/event lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Append in completion order, overwrite slot 0 on failure,
    /// report the most recently observed failure
    #[default]
    CompletionOrder,
    /// Slot `i` always holds the outcome of input `i`
    InputOrder,
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Result shaping policy
    pub aggregation: AggregationMode,
    /// Per-task deadline in milliseconds
    pub task_timeout_ms: Option<u64>,
    /// Maximum number of backend calls in flight for one batch
    pub max_parallel: Option<usize>,
    /// First argument routed to the primary backend
    pub config_block_marker: String,
    /// Chaincodes exempt from per-backend version qualification
    pub system_chaincodes: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::CompletionOrder,
            task_timeout_ms: None,
            max_parallel: None,
            config_block_marker: CONFIG_BLOCK_MARKER.to_string(),
            system_chaincodes: DEFAULT_SYSTEM_CHAINCODES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CoordinatorConfig {
    /// Create a new builder for CoordinatorConfig
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::new()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CoordinatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == Some(0) {
            return Err(EndorserError::configuration(
                "max_parallel must be greater than 0",
            ));
        }
        if self.task_timeout_ms == Some(0) {
            return Err(EndorserError::configuration(
                "task_timeout_ms must be greater than 0",
            ));
        }
        if self.config_block_marker.is_empty() {
            return Err(EndorserError::configuration(
                "config_block_marker must not be empty",
            ));
        }
        Ok(())
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    /// Whether `name` is exempt from version qualification
    pub fn is_system_chaincode(&self, name: &str) -> bool {
        self.system_chaincodes.iter().any(|cc| cc == name)
    }
}

/// Builder for CoordinatorConfig
pub struct CoordinatorConfigBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
        }
    }

    pub fn aggregation(mut self, mode: AggregationMode) -> Self {
        self.config.aggregation = mode;
        self
    }

    /// Set the per-task deadline
    pub fn task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.task_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    /// Cap the number of concurrent backend calls
    pub fn max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.config.max_parallel = max_parallel;
        self
    }

    pub fn config_block_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.config_block_marker = marker.into();
        self
    }

    pub fn system_chaincodes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.system_chaincodes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CoordinatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for CoordinatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
