pub mod model;
pub mod pool;

pub use model::{REWARD_ADDRESS, Transaction, TxInput, TxKind};
pub use pool::TransactionPool;
