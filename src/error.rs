//! Error types for the ledger node.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("Amount {amount} exceeds balance {balance}")]
    InsufficientFunds { amount: u64, balance: u64 },
    #[error("Recipient must differ from the sender")]
    SelfTransfer,
    #[error("Invalid transaction: {0}")]
    Invalid(&'static str),
}

/// The block-data rule a candidate chain broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataViolation {
    #[error("miner rewards exceed limit in block {block}")]
    TooManyRewards { block: usize },
    #[error("miner reward is invalid in block {block}")]
    InvalidReward { block: usize },
    #[error("invalid transaction {id} in block {block}: {source}")]
    InvalidTransaction {
        block: usize,
        id: String,
        source: TransactionError,
    },
    #[error("invalid input amount for {id} in block {block}: expected {expected}, got {actual}")]
    InvalidInputAmount {
        block: usize,
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("transaction {id} appears more than once in block {block}")]
    DuplicateTransaction { block: usize, id: String },
    #[error("sender {address} spends more than once in block {block}")]
    DuplicateSender { block: usize, address: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("The incoming chain must be longer")]
    MustBeLonger,
    #[error("The incoming chain must be valid")]
    MustBeValid,
    #[error("The incoming chain has invalid data: {0}")]
    InvalidData(DataViolation),
    #[error("Mined block no longer extends the chain tip")]
    StaleTip,
    #[error("Mined block is invalid")]
    InvalidBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("invalid secret key hex")]
    InvalidHex,
    #[error("invalid secret key bytes")]
    InvalidKey,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("malformed HTTP response")]
    MalformedResponse,
    #[error("peer answered with status {0}")]
    Status(u16),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("mining task failed: {0}")]
    Mining(String),
}
