use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::blockchain::{Block, Blockchain};
use crate::error::NodeError;
use crate::pubsub::PubSub;
use crate::transaction::{Transaction, TransactionPool};

/// One mining cycle over a node's shared chain and pool.
pub struct TransactionMiner<'a> {
    pub blockchain: &'a Mutex<Blockchain>,
    pub pool: &'a Mutex<TransactionPool>,
    pub pubsub: &'a PubSub,
    pub miner_address: String,
}

impl TransactionMiner<'_> {
    /// - Take the pool's valid transactions and add the miner's reward
    /// - Mine a block on the current tip on a blocking worker
    /// - Commit it, broadcast the new chain, clear the pool
    ///
    /// If the tip moved while mining the block is dropped, the pool is kept
    /// and [`ChainError::StaleTip`](crate::error::ChainError::StaleTip) is
    /// returned.
    pub async fn mine_transactions(&self) -> Result<Block, NodeError> {
        let mut data = self.pool.lock().valid_transactions();
        debug!("MINER - selected {} txs from pool", data.len());
        data.push(Transaction::reward(&self.miner_address));

        let last_block = self.blockchain.lock().last_block().clone();
        let block = tokio::task::spawn_blocking(move || Block::mine(&last_block, data))
            .await
            .map_err(|e| NodeError::Mining(e.to_string()))?;

        let chain = {
            let mut bc = self.blockchain.lock();
            if let Err(e) = bc.append_mined_block(block.clone()) {
                warn!("MINER - discarding block {}: {}", block.hash, e);
                return Err(e.into());
            }
            bc.chain().to_vec()
        };
        info!(
            "MINER - sealed block #{} (hash={}, nonce={}, difficulty={}, txs={})",
            chain.len() - 1,
            block.hash,
            block.nonce,
            block.difficulty,
            block.data.len()
        );

        self.pubsub.broadcast_chain(&chain);
        self.pool.lock().clear();
        Ok(block)
    }
}
