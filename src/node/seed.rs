use log::info;

use super::Node;
use crate::error::NodeError;
use crate::wallet::Wallet;

pub const SEED_ROUNDS: usize = 10;

impl Node {
    /// Populate the chain with demo activity between this node's wallet and
    /// two throwaway wallets, mining one block per round.
    pub async fn seed_demo_data(&self) -> Result<(), NodeError> {
        let mut foo = Wallet::new();
        let mut bar = Wallet::new();
        let own = self.address();

        for round in 0..SEED_ROUNDS {
            match round % 3 {
                0 => {
                    self.transact(foo.public_key(), 5)?;
                    self.seed_transfer(&mut foo, bar.public_key(), 10)?;
                }
                1 => {
                    self.transact(bar.public_key(), 10)?;
                    self.seed_transfer(&mut bar, foo.public_key(), 15)?;
                }
                _ => {
                    self.seed_transfer(&mut foo, &own, 20)?;
                    self.seed_transfer(&mut bar, &own, 25)?;
                }
            }
            self.mine_transactions().await?;
        }

        info!("SEED - mined {SEED_ROUNDS} demo blocks");
        Ok(())
    }

    fn seed_transfer(&self, from: &mut Wallet, to: &str, amount: u64) -> Result<(), NodeError> {
        let tx = {
            let bc = self.blockchain.lock();
            from.create_transaction(to, amount, Some(bc.chain()))?
        };
        self.submit_transaction(tx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use crate::pubsub::NoopTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn seeded_chain_is_valid() {
        let node = Node::new(Wallet::new(), Arc::new(NoopTransport));
        node.seed_demo_data().await.expect("seed");

        let chain = node.chain_snapshot();
        assert_eq!(chain.len(), SEED_ROUNDS + 1);
        assert!(Blockchain::is_valid_chain(&chain));
        assert!(Blockchain::valid_transaction_data(&chain));
        // two transfers plus the reward in every round
        assert!(chain[1..].iter().all(|block| block.data.len() == 3));
        assert!(node.pool_snapshot().is_empty());
    }
}
