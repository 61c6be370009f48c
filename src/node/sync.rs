use std::collections::HashMap;

use log::info;

use super::Node;
use crate::blockchain::Block;
use crate::error::{ChainError, NodeError};
use crate::pubsub::http::get_json;
use crate::transaction::Transaction;

pub const BLOCKS_PATH: &str = "/api/v1/blocks/";
pub const POOL_MAP_PATH: &str = "/api/v1/transaction-pool-map/";

impl Node {
    /// Bootstrap from the root node: adopt its chain if it is longer and
    /// valid, then take over its pool snapshot.
    pub async fn sync_with_root(&self, root_addr: &str) -> Result<(), NodeError> {
        let chain: Vec<Block> = get_json(root_addr, BLOCKS_PATH).await?;
        info!("SYNC - received {} blocks from {root_addr}", chain.len());
        self.adopt_root_chain(chain)?;

        let map: HashMap<String, Transaction> = get_json(root_addr, POOL_MAP_PATH).await?;
        info!("SYNC - received {} pending txs from {root_addr}", map.len());
        self.adopt_pool(map);
        Ok(())
    }

    /// A root chain no longer than ours is not an error here: a fresh
    /// network has nothing but genesis to offer.
    fn adopt_root_chain(&self, chain: Vec<Block>) -> Result<(), ChainError> {
        match self.blockchain.lock().replace_chain(chain, true, |_| {}) {
            Ok(()) | Err(ChainError::MustBeLonger) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::NoopTransport;
    use crate::wallet::Wallet;
    use std::sync::Arc;

    fn lone_node() -> Node {
        Node::new(Wallet::new(), Arc::new(NoopTransport))
    }

    #[tokio::test]
    async fn adopts_longer_root_chain() {
        let root = lone_node();
        root.mine_transactions().await.expect("mine");
        let fresh = lone_node();
        fresh.adopt_root_chain(root.chain_snapshot()).unwrap();
        assert_eq!(fresh.chain_snapshot(), root.chain_snapshot());
    }

    #[test]
    fn genesis_only_root_is_fine() {
        let fresh = lone_node();
        assert!(fresh.adopt_root_chain(vec![Block::genesis()]).is_ok());
        assert_eq!(fresh.chain_snapshot().len(), 1);
    }

    #[test]
    fn forged_root_chain_is_rejected() {
        let fresh = lone_node();
        let mut forged = vec![Block::genesis(), Block::genesis()];
        forged[1].data.push(Transaction::reward("x"));
        assert_eq!(
            fresh.adopt_root_chain(forged),
            Err(ChainError::MustBeValid)
        );
    }

    #[tokio::test]
    async fn unreachable_root_is_a_transport_error() {
        let fresh = lone_node();
        let err = fresh.sync_with_root("127.0.0.1:9").await.unwrap_err();
        assert!(matches!(err, NodeError::Transport(_)));
    }
}
