//! Value types exchanged between the endorser, the coordinator and the
//! execution backends.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Auxiliary byte annotations attached to an input before execution
pub type Decorations = HashMap<String, Bytes>;

/// A client's request to execute a chaincode function
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub header: Bytes,
    pub payload: Bytes,
}

impl Proposal {
    pub fn new(header: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            header: header.into(),
            payload: payload.into(),
        }
    }
}

/// A signed proposal as received from the client
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal_bytes: Bytes,
    pub signature: Bytes,
}

/// Function name, arguments and decorations for one chaincode invocation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInput {
    pub args: Vec<Bytes>,
    pub decorations: Decorations,
    pub is_init: bool,
}

impl ChaincodeInput {
    /// Build an input from string arguments
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            args: args
                .into_iter()
                .map(|a| Bytes::copy_from_slice(a.as_ref().as_bytes()))
                .collect(),
            decorations: Decorations::new(),
            is_init: false,
        }
    }

    /// The first argument, conventionally the function name
    pub fn function(&self) -> Option<&[u8]> {
        self.args.first().map(|a| a.as_ref())
    }
}

/// Chaincode name and the version resolved for one backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChaincodeContext {
    pub name: String,
    pub version: String,
}

impl ChaincodeContext {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Per-transaction parameters handed to every backend call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    pub tx_id: String,
    pub channel_id: String,
    pub signed_proposal: Option<SignedProposal>,
    pub proposal: Option<Proposal>,
    /// Decorations of the input this copy is dispatched with
    pub proposal_decorations: Decorations,
}

impl TransactionParams {
    pub fn new(channel_id: impl Into<String>, tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            channel_id: channel_id.into(),
            ..Default::default()
        }
    }
}

/// Chaincode response as returned by a backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Bytes,
}

impl Response {
    pub const OK: i32 = 200;
    pub const ERROR: i32 = 500;

    /// A 200 response carrying `payload`
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Self {
            status: Self::OK,
            message: String::new(),
            payload: payload.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Self::ERROR,
            message: message.into(),
            payload: Bytes::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status < 400
    }
}

/// Event emitted by a chaincode during simulation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    pub chaincode_id: String,
    pub tx_id: String,
    pub event_name: String,
    pub payload: Bytes,
}

/// What a backend returns for one successful invocation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub response: Response,
    pub event: Option<ChaincodeEvent>,
}

impl ExecutionOutput {
    pub fn new(response: Response, event: Option<ChaincodeEvent>) -> Self {
        Self { response, event }
    }
}

/// Chaincode runtime declared in a deployment spec
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaincodeType {
    #[default]
    Golang,
    Node,
    Car,
    Java,
}

/// Chaincode identity plus the input of the invocation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeSpec {
    pub chaincode_type: ChaincodeType,
    pub name: String,
    pub version: String,
    pub input: ChaincodeInput,
}

/// A chaincode spec together with its code package
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeDeploymentSpec {
    pub chaincode_spec: ChaincodeSpec,
    pub code_package: Bytes,
}

/// Definition of an instantiated chaincode as recorded on the ledger
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeDefinition {
    pub name: String,
    pub version: String,
    pub endorsement_plugin: String,
    pub validation_plugin: String,
    pub instantiation_policy: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_function() {
        let input = ChaincodeInput::from_args(["invoke", "a", "b"]);
        assert_eq!(input.function(), Some(&b"invoke"[..]));
        assert!(input.decorations.is_empty());
        assert_eq!(ChaincodeInput::default().function(), None);
    }

    #[test]
    fn test_response_status() {
        assert!(Response::ok("x").is_ok());
        assert!(!Response::error("bad").is_ok());
    }
}
