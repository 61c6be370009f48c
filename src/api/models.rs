use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::transaction::Transaction;

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub index: usize,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub transactions: Vec<Transaction>,
}

impl MineResponse {
    pub fn new(index: usize, block: Block) -> Self {
        Self {
            index,
            hash: block.hash,
            nonce: block.nonce,
            difficulty: block.difficulty,
            transactions: block.data,
        }
    }
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct TransactRequest {
    pub amount: u64,
    pub recipient: String,
}

/// Tagged outcome body: `{"type": "success", "transaction": ..}` or
/// `{"type": "error", "message": ..}`.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactResponse {
    Success { transaction: Transaction },
    Error { message: String },
}

/* ---------- Wallet / Balance API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub mine_rate_ms: i64,
    pub last_interval_ms: Option<i64>,
    pub mempool_size: usize,
}
