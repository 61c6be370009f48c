use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{GENESIS_HASH, GENESIS_LAST_HASH, GENESIS_TIMESTAMP, INITIAL_DIFFICULTY, MINE_RATE};
use crate::transaction::Transaction;
use crate::util::{crypto_hash, leading_zero_bits};

/// A mined, hash-linked container of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub timestamp: i64, // Unix timestamp in milliseconds (UTC)
    pub last_hash: String,
    pub hash: String,
    pub data: Vec<Transaction>,
    pub nonce: u64,
    pub difficulty: u32, // required leading zero bits
}

impl Block {
    /// The fixed first block shared by every node.
    pub fn genesis() -> Self {
        Self {
            timestamp: GENESIS_TIMESTAMP,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            data: Vec::new(),
            nonce: 0,
            difficulty: INITIAL_DIFFICULTY,
        }
    }

    /// Proof-of-Work: search nonces until the hash has at least `difficulty`
    /// leading zero bits. Timestamp and difficulty are refreshed on every
    /// attempt, so the difficulty may move while mining.
    ///
    /// CPU-bound with no upper bound on running time; call it from a
    /// blocking worker, never from a request handler.
    pub fn mine(last_block: &Block, data: Vec<Transaction>) -> Self {
        // the data part of the preimage is the same for every attempt
        let data_value = json!(data);
        let mut nonce: u64 = 0;
        loop {
            nonce = nonce.wrapping_add(1);
            let timestamp = Utc::now().timestamp_millis();
            let difficulty = Self::adjust_difficulty(last_block, timestamp);
            let hash = Self::hash_fields(
                timestamp,
                &last_block.hash,
                data_value.clone(),
                nonce,
                difficulty,
            );
            if leading_zero_bits(&hash) >= difficulty {
                return Self {
                    timestamp,
                    last_hash: last_block.hash.clone(),
                    hash,
                    data,
                    nonce,
                    difficulty,
                };
            }
        }
    }

    /// Binary retarget: one bit easier when the block took longer than
    /// [`MINE_RATE`], one bit harder otherwise. Never below 1.
    pub fn adjust_difficulty(original_block: &Block, timestamp: i64) -> u32 {
        let difficulty = original_block.difficulty;
        if difficulty < 1 {
            return 1;
        }
        // timestamps of received blocks are arbitrary
        if timestamp.saturating_sub(original_block.timestamp) > MINE_RATE {
            return (difficulty - 1).max(1);
        }
        difficulty + 1
    }

    fn hash_fields(
        timestamp: i64,
        last_hash: &str,
        data: Value,
        nonce: u64,
        difficulty: u32,
    ) -> String {
        crypto_hash(&[
            json!(timestamp),
            json!(last_hash),
            data,
            json!(nonce),
            json!(difficulty),
        ])
    }

    /// Hash recomputed from the block's content (excluding `hash`).
    pub fn compute_hash(&self) -> String {
        Self::hash_fields(
            self.timestamp,
            &self.last_hash,
            json!(self.data),
            self.nonce,
            self.difficulty,
        )
    }

    /// Whether the stored hash satisfies the block's own difficulty.
    pub fn meets_difficulty(&self) -> bool {
        self.difficulty >= 1 && leading_zero_bits(&self.hash) >= self.difficulty
    }
}
