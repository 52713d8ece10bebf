//! Peer collaborators consumed by the endorser support facade
//!
//! These are thin interfaces over the ledger, access control, system
//! chaincode and chaincode package services of a peer.

pub mod memory;
pub mod support;

pub use memory::{InMemoryLedger, InMemoryPeer};
pub use support::{ExecutionRequest, Support, SupportBuilder};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::errors::Result;
use crate::model::{ChaincodeDeploymentSpec, SignedProposal};

/// ACL resource checked for every proposal
pub const PEER_PROPOSE: &str = "peer/Propose";

/// Read access to world state
pub trait QueryExecutor: Send + Sync {
    fn get_state(&self, namespace: &str, key: &str) -> Result<Option<Bytes>>;
}

/// Simulation handle for one transaction
pub trait TxSimulator: QueryExecutor {
    fn tx_id(&self) -> &str;

    fn set_state(&self, namespace: &str, key: &str, value: Bytes) -> Result<()>;

    fn delete_state(&self, namespace: &str, key: &str) -> Result<()>;
}

/// One historic value of a key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: String,
    pub value: Option<Bytes>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub trait HistoryQueryExecutor: Send + Sync {
    fn history_for_key(&self, namespace: &str, key: &str) -> Result<Vec<KeyModification>>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub height: u64,
    pub current_block_hash: Bytes,
    pub previous_block_hash: Bytes,
}

/// A committed transaction and its validation code
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub tx_id: String,
    pub envelope: Bytes,
    pub validation_code: i32,
}

/// Ledger of one channel
pub trait Ledger: Send + Sync {
    fn new_query_executor(&self) -> Result<Box<dyn QueryExecutor>>;

    fn new_tx_simulator(&self, tx_id: &str) -> Result<Box<dyn TxSimulator>>;

    fn new_history_query_executor(&self) -> Result<Box<dyn HistoryQueryExecutor>>;

    fn get_transaction_by_id(&self, tx_id: &str) -> Result<ProcessedTransaction>;

    fn blockchain_info(&self) -> Result<BlockchainInfo>;
}

/// Channel name to ledger lookup
pub trait PeerLedgers: Send + Sync {
    fn get_ledger(&self, channel_id: &str) -> Option<Arc<dyn Ledger>>;
}

pub trait SystemChaincodeProvider: Send + Sync {
    fn is_sys_cc(&self, name: &str) -> bool;

    fn is_sys_cc_and_not_invokable_external(&self, name: &str) -> bool;
}

/// Fixed system chaincode table
#[derive(Clone, Debug)]
pub struct StaticSystemChaincodes {
    system: HashSet<String>,
    internal_only: HashSet<String>,
}

impl StaticSystemChaincodes {
    pub fn new<I, S>(system: I, internal_only: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            system: system.into_iter().map(Into::into).collect(),
            internal_only: internal_only.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StaticSystemChaincodes {
    fn default() -> Self {
        Self::new(
            vec!["cscc", "lscc", "qscc", "escc", "vscc"],
            vec!["escc", "vscc"],
        )
    }
}

impl SystemChaincodeProvider for StaticSystemChaincodes {
    fn is_sys_cc(&self, name: &str) -> bool {
        self.system.contains(name)
    }

    fn is_sys_cc_and_not_invokable_external(&self, name: &str) -> bool {
        self.system.contains(name) && self.internal_only.contains(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub channel_id: String,
    pub tx_id: String,
    pub epoch: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    pub creator: Bytes,
    pub nonce: Bytes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeHeaderExtension {
    pub chaincode_name: String,
}

pub trait AclProvider: Send + Sync {
    fn check_acl(&self, resource: &str, channel_id: &str, signed_proposal: &SignedProposal) -> Result<()>;
}

/// Access to installed chaincode packages
pub trait ChaincodeStore: Send + Sync {
    /// Installed package for `name:version`
    fn get_chaincode_from_fs(&self, name: &str, version: &str) -> Result<ChaincodeDeploymentSpec>;

    /// Decode raw package bytes
    fn parse_package(&self, package: &[u8]) -> Result<ChaincodeDeploymentSpec>;

    /// Instantiation policy carried by the installed package, if any
    fn instantiation_policy(&self, name: &str, version: &str) -> Result<Option<Bytes>>;
}

pub trait SigningIdentity: Send + Sync {
    fn serialize(&self) -> Result<Bytes>;

    fn sign(&self, message: &[u8]) -> Result<Bytes>;
}

/// Application section of a channel configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub organizations: Vec<String>,
    pub capabilities: Vec<String>,
}

pub trait ApplicationConfigSource: Send + Sync {
    fn application_config(&self, channel_id: &str) -> Option<ApplicationConfig>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_system_chaincodes() {
        let table = StaticSystemChaincodes::default();
        assert!(table.is_sys_cc("lscc"));
        assert!(!table.is_sys_cc("mycc"));
        assert!(table.is_sys_cc_and_not_invokable_external("vscc"));
        assert!(!table.is_sys_cc_and_not_invokable_external("cscc"));
    }
}
