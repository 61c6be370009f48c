//! An in-memory proof-of-work ledger node: signed account transfers, a
//! longest-valid-chain ledger, a mempool and a miner, replicated between
//! peers by broadcasting whole chains and single transactions.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod miner;
pub mod node;
pub mod pubsub;
pub mod transaction;
pub mod util;
pub mod wallet;
