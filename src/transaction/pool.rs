use std::collections::{HashMap, HashSet};

use log::debug;

use super::model::Transaction;
use crate::blockchain::Block;

/// Pending transactions keyed by id.
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    transaction_map: HashMap<String, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            transaction_map: HashMap::new(),
        }
    }

    /// Insert or replace by id.
    pub fn set_transaction(&mut self, tx: Transaction) {
        self.transaction_map.insert(tx.id.clone(), tx);
    }

    /// Replace the whole pool, e.g. with a peer's snapshot.
    pub fn set_map(&mut self, transaction_map: HashMap<String, Transaction>) {
        self.transaction_map = transaction_map;
    }

    pub fn clear(&mut self) {
        self.transaction_map.clear();
    }

    pub fn transaction_map(&self) -> &HashMap<String, Transaction> {
        &self.transaction_map
    }

    /// The pending transaction sent from `address`, if any.
    pub fn existing_transaction(&self, address: &str) -> Option<&Transaction> {
        self.transaction_map
            .values()
            .find(|tx| tx.input.address == address)
    }

    /// Mining candidates. Invalid entries are skipped but stay in the pool.
    /// At most one transfer per sender is returned, the oldest by input
    /// timestamp; a block may only spend each sender's balance once.
    pub fn valid_transactions(&self) -> Vec<Transaction> {
        let mut candidates: Vec<&Transaction> = self
            .transaction_map
            .values()
            .filter(|tx| match tx.validate() {
                Ok(()) => true,
                Err(e) => {
                    debug!("POOL - skipping tx {}: {}", tx.id, e);
                    false
                }
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.input
                .timestamp
                .cmp(&b.input.timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut senders = HashSet::new();
        candidates
            .into_iter()
            .filter(|tx| {
                let first = senders.insert(tx.input.address.as_str());
                if !first {
                    debug!("POOL - deferring tx {}: sender already selected", tx.id);
                }
                first
            })
            .cloned()
            .collect()
    }

    /// Drop every pending transaction already recorded in `chain`.
    pub fn clear_blockchain_transactions(&mut self, chain: &[Block]) {
        let before = self.transaction_map.len();
        for block in chain.iter().skip(1) {
            for tx in &block.data {
                self.transaction_map.remove(&tx.id);
            }
        }
        debug!(
            "POOL - cleared settled transactions: {} -> {}",
            before,
            self.transaction_map.len()
        );
    }

    pub fn len(&self) -> usize {
        self.transaction_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_map.is_empty()
    }
}
