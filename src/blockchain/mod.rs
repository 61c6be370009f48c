pub mod block;
pub mod model;

pub use block::Block;
pub use model::Blockchain;

/// Target milliseconds per block for difficulty retargeting.
pub const MINE_RATE: i64 = 1000;

/// Difficulty of the genesis block (leading zero bits).
pub const INITIAL_DIFFICULTY: u32 = 3;

/// Fixed reward credited to the miner of each block.
pub const MINING_REWARD: u64 = 50;

/// Genesis constants; every node must agree on them exactly.
pub const GENESIS_TIMESTAMP: i64 = 1;
pub const GENESIS_LAST_HASH: &str = "-----";
pub const GENESIS_HASH: &str = "hash-one";
