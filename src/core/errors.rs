use thiserror::Error;

/// Unified error type for the endorser execution layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndorserError {
    /// A backend reported a failure while executing a chaincode invocation
    #[error("Execution failed on backend {backend}: {message}")]
    Backend { backend: String, message: String },

    /// An invocation did not finish before its deadline
    #[error("Operation timed out: {operation} (timeout: {timeout_ms}ms)")]
    Timeout { operation: String, timeout_ms: u64 },

    /// A dispatched task ended without reporting an outcome
    #[error("Task {index} aborted: {message}")]
    TaskAborted { index: usize, message: String },

    /// The backend roster cannot serve the requested input index
    #[error("No backend for input {index} (roster size: {roster_len})")]
    Routing { index: usize, roster_len: usize },

    /// The channel has no ledger on this peer
    #[error("channel {channel} doesn't exist")]
    ChannelNotFound { channel: String },

    /// A ledger lookup or query failed
    #[error("{message}")]
    Ledger { channel: String, message: String },

    /// Chaincode package or definition errors
    #[error("Chaincode error: {name} - {message}")]
    Chaincode { name: String, message: String },

    /// Access control rejected the proposal
    #[error("Access denied on channel {channel}: {message}")]
    AccessDenied { channel: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EndorserError {
    /// Create a backend execution error
    pub fn backend<S: Into<String>, M: Into<String>>(backend: S, message: M) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn task_aborted<M: Into<String>>(index: usize, message: M) -> Self {
        Self::TaskAborted {
            index,
            message: message.into(),
        }
    }

    pub fn routing(index: usize, roster_len: usize) -> Self {
        Self::Routing { index, roster_len }
    }

    /// Create a missing-channel error
    pub fn channel_not_found<S: Into<String>>(channel: S) -> Self {
        Self::ChannelNotFound {
            channel: channel.into(),
        }
    }

    /// Create a ledger error; the message is reported verbatim
    pub fn ledger<S: Into<String>, M: Into<String>>(channel: S, message: M) -> Self {
        Self::Ledger {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn chaincode<S: Into<String>, M: Into<String>>(name: S, message: M) -> Self {
        Self::Chaincode {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn access_denied<S: Into<String>, M: Into<String>>(channel: S, message: M) -> Self {
        Self::AccessDenied {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if the caller may reasonably resubmit the proposal
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::TaskAborted { .. } => true,
            Self::Backend { .. } => true, // the container may come back
            Self::Routing { .. } | Self::Configuration { .. } => false,
            Self::ChannelNotFound { .. } | Self::AccessDenied { .. } => false,
            _ => false,
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Backend { .. } => "backend",
            Self::Timeout { .. } => "timeout",
            Self::TaskAborted { .. } => "aborted",
            Self::Routing { .. } => "routing",
            Self::ChannelNotFound { .. } => "channel",
            Self::Ledger { .. } => "ledger",
            Self::Chaincode { .. } => "chaincode",
            Self::AccessDenied { .. } => "acl",
            Self::Configuration { .. } => "configuration",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EndorserError>;

impl From<serde_yaml::Error> for EndorserError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::configuration(format!("invalid yaml: {}", err))
    }
}

impl From<serde_json::Error> for EndorserError {
    fn from(err: serde_json::Error) -> Self {
        Self::configuration(format!("invalid json: {}", err))
    }
}

impl From<anyhow::Error> for EndorserError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = EndorserError::backend("peer0-cc", "chaincode crashed");
        assert!(matches!(err, EndorserError::Backend { .. }));
        assert_eq!(err.category(), "backend");
        assert_eq!(
            err.to_string(),
            "Execution failed on backend peer0-cc: chaincode crashed"
        );
    }

    #[test]
    fn test_channel_message() {
        let err = EndorserError::channel_not_found("mychannel");
        assert_eq!(err.to_string(), "channel mychannel doesn't exist");
    }

    #[test]
    fn test_error_retryability() {
        assert!(EndorserError::timeout("invoke", 1000).is_retryable());
        assert!(!EndorserError::routing(3, 2).is_retryable());
        assert!(!EndorserError::configuration("test").is_retryable());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: EndorserError = anyhow::anyhow!("boom").context("outer").into();
        assert_eq!(err, EndorserError::internal("outer: boom"));
    }
}
