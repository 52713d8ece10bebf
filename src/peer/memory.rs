//! In-memory ledgers for embedding and tests

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::core::errors::{EndorserError, Result};
use crate::peer::{
    BlockchainInfo, HistoryQueryExecutor, KeyModification, Ledger, PeerLedgers,
    ProcessedTransaction, QueryExecutor, TxSimulator,
};

type StateKey = (String, String);

fn state_key(namespace: &str, key: &str) -> StateKey {
    (namespace.to_string(), key.to_string())
}

/// World state, history and committed transactions of one channel
#[derive(Debug)]
struct LedgerStore {
    channel_id: String,
    state: DashMap<StateKey, Bytes>,
    history: DashMap<StateKey, Vec<KeyModification>>,
    transactions: DashMap<String, ProcessedTransaction>,
    height: AtomicU64,
    last_hash: Mutex<Bytes>,
}

/// A channel ledger held entirely in memory
#[derive(Clone, Debug)]
pub struct InMemoryLedger {
    store: Arc<LedgerStore>,
}

impl InMemoryLedger {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            store: Arc::new(LedgerStore {
                channel_id: channel_id.into(),
                state: DashMap::new(),
                history: DashMap::new(),
                transactions: DashMap::new(),
                height: AtomicU64::new(0),
                last_hash: Mutex::new(Bytes::new()),
            }),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.store.channel_id
    }

    /// Write a value directly, recording it in the key history
    pub fn put_state(&self, namespace: &str, key: &str, value: Option<Bytes>, tx_id: &str) {
        let k = state_key(namespace, key);
        match &value {
            Some(v) => {
                self.store.state.insert(k.clone(), v.clone());
            }
            None => {
                self.store.state.remove(&k);
            }
        }
        self.store.history.entry(k).or_default().push(KeyModification {
            tx_id: tx_id.to_string(),
            value,
            timestamp: Utc::now(),
        });
    }

    /// Append a block holding `txs`; returns the new height
    pub fn commit_block(&self, block_hash: Bytes, txs: Vec<ProcessedTransaction>) -> u64 {
        for tx in txs {
            self.store.transactions.insert(tx.tx_id.clone(), tx);
        }
        *self.store.last_hash.lock() = block_hash;
        let height = self.store.height.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(channel = %self.store.channel_id, height, "Committed block");
        height
    }
}

impl Ledger for InMemoryLedger {
    fn new_query_executor(&self) -> Result<Box<dyn QueryExecutor>> {
        Ok(Box::new(StateReader {
            store: self.store.clone(),
        }))
    }

    fn new_tx_simulator(&self, tx_id: &str) -> Result<Box<dyn TxSimulator>> {
        if tx_id.is_empty() {
            return Err(EndorserError::ledger(
                self.store.channel_id.clone(),
                "a transaction simulator requires a transaction id",
            ));
        }
        Ok(Box::new(Simulator {
            reader: StateReader {
                store: self.store.clone(),
            },
            tx_id: tx_id.to_string(),
            writes: DashMap::new(),
        }))
    }

    fn new_history_query_executor(&self) -> Result<Box<dyn HistoryQueryExecutor>> {
        Ok(Box::new(StateReader {
            store: self.store.clone(),
        }))
    }

    fn get_transaction_by_id(&self, tx_id: &str) -> Result<ProcessedTransaction> {
        self.store
            .transactions
            .get(tx_id)
            .map(|tx| tx.clone())
            .ok_or_else(|| {
                EndorserError::ledger(
                    self.store.channel_id.clone(),
                    format!("no such transaction ID [{}] in index", tx_id),
                )
            })
    }

    fn blockchain_info(&self) -> Result<BlockchainInfo> {
        let current = self.store.last_hash.lock().clone();
        Ok(BlockchainInfo {
            height: self.store.height.load(Ordering::SeqCst),
            current_block_hash: current,
            previous_block_hash: Bytes::new(),
        })
    }
}

struct StateReader {
    store: Arc<LedgerStore>,
}

impl QueryExecutor for StateReader {
    fn get_state(&self, namespace: &str, key: &str) -> Result<Option<Bytes>> {
        Ok(self
            .store
            .state
            .get(&state_key(namespace, key))
            .map(|v| v.clone()))
    }
}

impl HistoryQueryExecutor for StateReader {
    fn history_for_key(&self, namespace: &str, key: &str) -> Result<Vec<KeyModification>> {
        Ok(self
            .store
            .history
            .get(&state_key(namespace, key))
            .map(|h| h.clone())
            .unwrap_or_default())
    }
}

/// Reads through to committed state; writes stay private to the simulation
struct Simulator {
    reader: StateReader,
    tx_id: String,
    writes: DashMap<StateKey, Option<Bytes>>,
}

impl QueryExecutor for Simulator {
    fn get_state(&self, namespace: &str, key: &str) -> Result<Option<Bytes>> {
        if let Some(pending) = self.writes.get(&state_key(namespace, key)) {
            return Ok(pending.clone());
        }
        self.reader.get_state(namespace, key)
    }
}

impl TxSimulator for Simulator {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn set_state(&self, namespace: &str, key: &str, value: Bytes) -> Result<()> {
        self.writes.insert(state_key(namespace, key), Some(value));
        Ok(())
    }

    fn delete_state(&self, namespace: &str, key: &str) -> Result<()> {
        self.writes.insert(state_key(namespace, key), None);
        Ok(())
    }
}

/// Peer holding one in-memory ledger per joined channel
#[derive(Clone, Default)]
pub struct InMemoryPeer {
    ledgers: Arc<DashMap<String, InMemoryLedger>>,
}

impl InMemoryPeer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or return the existing) ledger for a channel
    pub fn join_channel(&self, channel_id: &str) -> InMemoryLedger {
        self.ledgers
            .entry(channel_id.to_string())
            .or_insert_with(|| InMemoryLedger::new(channel_id))
            .clone()
    }

    pub fn channels(&self) -> Vec<String> {
        self.ledgers.iter().map(|e| e.key().clone()).collect()
    }
}

impl PeerLedgers for InMemoryPeer {
    fn get_ledger(&self, channel_id: &str) -> Option<Arc<dyn Ledger>> {
        self.ledgers
            .get(channel_id)
            .map(|l| Arc::new(l.clone()) as Arc<dyn Ledger>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_isolates_writes() {
        let ledger = InMemoryLedger::new("ch1");
        ledger.put_state("mycc", "a", Some(Bytes::from("1")), "tx0");

        let sim = ledger.new_tx_simulator("tx1").unwrap();
        sim.set_state("mycc", "a", Bytes::from("2")).unwrap();
        assert_eq!(sim.get_state("mycc", "a").unwrap(), Some(Bytes::from("2")));

        let query = ledger.new_query_executor().unwrap();
        assert_eq!(query.get_state("mycc", "a").unwrap(), Some(Bytes::from("1")));
    }

    #[test]
    fn test_history_and_height() {
        let ledger = InMemoryLedger::new("ch1");
        ledger.put_state("mycc", "a", Some(Bytes::from("1")), "tx0");
        ledger.put_state("mycc", "a", None, "tx1");

        let history = ledger
            .new_history_query_executor()
            .unwrap()
            .history_for_key("mycc", "a")
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].value, None);

        assert_eq!(ledger.blockchain_info().unwrap().height, 0);
        ledger.commit_block(Bytes::from("h1"), vec![]);
        assert_eq!(ledger.blockchain_info().unwrap().height, 1);
    }

    #[test]
    fn test_peer_lookup() {
        let peer = InMemoryPeer::new();
        peer.join_channel("ch1");
        assert!(peer.get_ledger("ch1").is_some());
        assert!(peer.get_ledger("ch2").is_none());
    }
}
