//! The ledger state of one node and the operations applied to it.
//!
//! Lock order is always chain, then pool, then wallet. No lock is held
//! across an `.await` or while a block is being mined.

pub mod seed;
pub mod sync;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::blockchain::{Block, Blockchain};
use crate::error::{ChainError, NodeError, TransactionError};
use crate::miner::TransactionMiner;
use crate::pubsub::{Envelope, Message, PubSub, Transport};
use crate::transaction::{Transaction, TransactionPool};
use crate::wallet::{Wallet, calculate_balance};

pub struct Node {
    blockchain: Mutex<Blockchain>,
    pool: Mutex<TransactionPool>,
    wallet: Mutex<Wallet>,
    pubsub: PubSub,
}

impl Node {
    pub fn new(wallet: Wallet, transport: Arc<dyn Transport>) -> Self {
        Self {
            blockchain: Mutex::new(Blockchain::new()),
            pool: Mutex::new(TransactionPool::new()),
            wallet: Mutex::new(wallet),
            pubsub: PubSub::new(Uuid::new_v4(), transport),
        }
    }

    pub fn id(&self) -> Uuid {
        self.pubsub.origin()
    }

    pub fn blockchain(&self) -> &Mutex<Blockchain> {
        &self.blockchain
    }

    pub fn pool(&self) -> &Mutex<TransactionPool> {
        &self.pool
    }

    pub fn address(&self) -> String {
        self.wallet.lock().public_key().to_string()
    }

    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.blockchain.lock().chain().to_vec()
    }

    pub fn pool_snapshot(&self) -> HashMap<String, Transaction> {
        self.pool.lock().transaction_map().clone()
    }

    /// Apply a broadcast envelope. Envelopes this node published itself are
    /// ignored.
    pub fn handle_message(&self, envelope: Envelope) {
        if self.pubsub.is_own(&envelope) {
            debug!("PUBSUB - ignoring own {} message", envelope.message.channel());
            return;
        }
        info!(
            "PUBSUB - message received. Channel: {}. Origin: {}",
            envelope.message.channel(),
            envelope.origin
        );
        match envelope.message {
            Message::Blockchain(chain) => {
                // rejection is already logged by replace_chain
                let _ = self.receive_chain(chain);
            }
            Message::Transaction(tx) => self.receive_transaction(tx),
        }
    }

    /// Fork choice against a peer's chain. On acceptance the pool drops the
    /// transactions the new chain already settles.
    pub fn receive_chain(&self, chain: Vec<Block>) -> Result<(), ChainError> {
        let mut bc = self.blockchain.lock();
        bc.replace_chain(chain, true, |accepted| {
            self.pool.lock().clear_blockchain_transactions(accepted);
        })
    }

    pub fn receive_transaction(&self, tx: Transaction) {
        debug!("POOL - upsert tx {}", tx.id);
        self.pool.lock().set_transaction(tx);
    }

    /// Stage `tx` locally and broadcast it.
    pub fn submit_transaction(&self, tx: Transaction) {
        self.pool.lock().set_transaction(tx.clone());
        self.pubsub.broadcast_transaction(&tx);
    }

    /// Send `amount` from the node's wallet to `recipient`. While the wallet
    /// already has a pending transaction the transfer is batched into it.
    /// The lookup and the pool write happen under one set of locks; only the
    /// broadcast runs after they are released.
    pub fn transact(&self, recipient: &str, amount: u64) -> Result<Transaction, TransactionError> {
        let tx = {
            let bc = self.blockchain.lock();
            let mut pool = self.pool.lock();
            let mut wallet = self.wallet.lock();

            let tx = match pool.existing_transaction(wallet.public_key()) {
                Some(existing) => {
                    let mut tx = existing.clone();
                    tx.update(&wallet, recipient, amount)?;
                    tx
                }
                None => wallet.create_transaction(recipient, amount, Some(bc.chain()))?,
            };
            pool.set_transaction(tx.clone());
            tx
        };
        self.pubsub.broadcast_transaction(&tx);
        Ok(tx)
    }

    /// Run one mining cycle with the node's wallet as reward recipient.
    pub async fn mine_transactions(&self) -> Result<Block, NodeError> {
        let miner = TransactionMiner {
            blockchain: &self.blockchain,
            pool: &self.pool,
            pubsub: &self.pubsub,
            miner_address: self.address(),
        };
        miner.mine_transactions().await
    }

    /// Address and chain-derived balance of the node's wallet. Refreshes the
    /// wallet's cached balance.
    pub fn wallet_info(&self) -> (String, u64) {
        let bc = self.blockchain.lock();
        let mut wallet = self.wallet.lock();
        wallet.balance = calculate_balance(bc.chain(), wallet.public_key());
        (wallet.public_key().to_string(), wallet.balance)
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        calculate_balance(self.blockchain.lock().chain(), address)
    }

    /// Replace the pool with a peer's snapshot.
    pub fn adopt_pool(&self, map: HashMap<String, Transaction>) {
        let mut pool = self.pool.lock();
        if !pool.is_empty() {
            warn!("POOL - replacing {} pending transactions with a snapshot", pool.len());
        }
        pool.set_map(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use crate::pubsub::{LocalHub, NoopTransport};
    use crate::wallet::STARTING_BALANCE;
    use std::time::Duration;

    fn lone_node() -> Node {
        Node::new(Wallet::new(), Arc::new(NoopTransport))
    }

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }

    #[tokio::test]
    async fn end_to_end_transfer_and_mine() {
        let node = lone_node();
        let w = Wallet::new();
        let r = Wallet::new();

        let tx = Transaction::new(&w, r.public_key(), 10).unwrap();
        node.submit_transaction(tx.clone());

        let block = node.mine_transactions().await.expect("mine");
        assert!(block.data.contains(&tx));

        let chain = node.chain_snapshot();
        assert_eq!(chain.len(), 2);
        assert!(Blockchain::is_valid_chain(&chain));
        assert!(Blockchain::valid_transaction_data(&chain));
        assert_eq!(node.balance_of(w.public_key()), STARTING_BALANCE - 10);
        // r never spent, so its starting balance still counts
        assert_eq!(chain[1].data[0].output_map[r.public_key()], 10);
        assert_eq!(node.balance_of(r.public_key()), STARTING_BALANCE + 10);
        assert!(node.pool.lock().is_empty());
    }

    #[tokio::test]
    async fn miner_is_rewarded() {
        let node = lone_node();
        node.mine_transactions().await.expect("mine");
        let (_, balance) = node.wallet_info();
        assert_eq!(balance, STARTING_BALANCE + crate::blockchain::MINING_REWARD);
    }

    #[test]
    fn transact_batches_into_pending_transaction() {
        let node = lone_node();
        let a = Wallet::new();
        let b = Wallet::new();

        let first = node.transact(a.public_key(), 10).unwrap();
        let second = node.transact(b.public_key(), 20).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(node.pool.lock().len(), 1);
        assert_eq!(second.output_map[a.public_key()], 10);
        assert_eq!(second.output_map[b.public_key()], 20);
        assert_eq!(second.output_map[&node.address()], STARTING_BALANCE - 30);
        assert!(second.is_valid());
    }

    #[test]
    fn transact_over_balance_leaves_pool_untouched() {
        let node = lone_node();
        let err = node.transact("someone", STARTING_BALANCE + 1).unwrap_err();
        assert!(matches!(err, TransactionError::InsufficientFunds { .. }));
        assert!(node.pool.lock().is_empty());

        let tx = node.transact("someone", 900).unwrap();
        let err = node.transact("someone-else", 200).unwrap_err();
        assert!(matches!(err, TransactionError::InsufficientFunds { .. }));
        assert_eq!(node.pool.lock().transaction_map()[&tx.id], tx);
    }

    #[test]
    fn concurrent_transacts_never_overspend() {
        let node = lone_node();
        let accepted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let node = &node;
                    scope.spawn(move || node.transact(&format!("recipient-{i}"), 600).is_ok())
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(accepted, 1);
        let pool = node.pool_snapshot();
        assert_eq!(pool.len(), 1);
        let tx = pool.values().next().unwrap();
        assert_eq!(tx.input.amount, STARTING_BALANCE);
        assert!(tx.is_valid());
    }

    #[test]
    fn concurrent_transacts_batch_without_losing_transfers() {
        let node = lone_node();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let node = &node;
                scope.spawn(move || node.transact(&format!("recipient-{i}"), 100).unwrap());
            }
        });

        let pool = node.pool_snapshot();
        assert_eq!(pool.len(), 1);
        let tx = pool.values().next().unwrap();
        assert!(tx.is_valid());
        for i in 0..8 {
            assert_eq!(tx.output_map[&format!("recipient-{i}")], 100);
        }
        assert_eq!(tx.output_map[&node.address()], STARTING_BALANCE - 800);
    }

    #[tokio::test]
    async fn spend_after_mining_uses_chain_balance() {
        let node = lone_node();
        node.transact("someone", 100).unwrap();
        node.mine_transactions().await.expect("mine");

        let tx = node.transact("someone", 5).unwrap();
        assert_eq!(
            tx.input.amount,
            STARTING_BALANCE - 100 + crate::blockchain::MINING_REWARD
        );
        node.mine_transactions().await.expect("mine");
        assert!(Blockchain::valid_transaction_data(&node.chain_snapshot()));
    }

    #[tokio::test]
    async fn ignores_own_messages_and_is_idempotent() {
        let node = lone_node();
        node.mine_transactions().await.expect("mine");
        let chain = node.chain_snapshot();

        node.handle_message(Envelope {
            origin: node.id(),
            message: Message::Blockchain(Vec::new()),
        });
        assert_eq!(node.chain_snapshot(), chain);

        // even when reprocessed as foreign input nothing changes
        assert_eq!(node.receive_chain(chain.clone()), Err(ChainError::MustBeLonger));
        assert_eq!(node.chain_snapshot(), chain);

        let tx = Transaction::new(&Wallet::new(), "x", 1).unwrap();
        node.receive_transaction(tx.clone());
        node.receive_transaction(tx);
        assert_eq!(node.pool.lock().len(), 1);
    }

    #[tokio::test]
    async fn accepted_chain_purges_settled_transactions() {
        let a = lone_node();
        let b = lone_node();

        let tx = a.transact("someone", 10).unwrap();
        b.receive_transaction(tx.clone());
        let unrelated = Transaction::new(&Wallet::new(), "x", 1).unwrap();
        b.receive_transaction(unrelated.clone());

        a.mine_transactions().await.expect("mine");
        b.receive_chain(a.chain_snapshot()).expect("replace");

        let pool = b.pool_snapshot();
        assert!(!pool.contains_key(&tx.id));
        assert!(pool.contains_key(&unrelated.id));
        assert_eq!(b.chain_snapshot(), a.chain_snapshot());
    }

    #[tokio::test]
    async fn rejected_chain_leaves_state_unchanged() {
        let a = lone_node();
        let b = lone_node();
        b.mine_transactions().await.expect("mine");
        b.mine_transactions().await.expect("mine");
        let before = b.chain_snapshot();

        a.mine_transactions().await.expect("mine");
        assert_eq!(b.receive_chain(a.chain_snapshot()), Err(ChainError::MustBeLonger));

        let mut forged = before.clone();
        forged.push(forged[forged.len() - 1].clone());
        assert_eq!(b.receive_chain(forged), Err(ChainError::MustBeValid));
        assert_eq!(b.chain_snapshot(), before);
    }

    #[tokio::test]
    async fn replicates_over_local_hub() {
        let hub = LocalHub::new();
        let a = Arc::new(Node::new(Wallet::new(), Arc::new(hub.clone())));
        let b = Arc::new(Node::new(Wallet::new(), Arc::new(hub.clone())));
        let _la = hub.spawn_listener(a.clone());
        let _lb = hub.spawn_listener(b.clone());

        let tx = a.transact(&b.address(), 25).unwrap();
        assert!(eventually(|| b.pool_snapshot().contains_key(&tx.id)).await);

        a.mine_transactions().await.expect("mine");
        assert!(eventually(|| b.chain_snapshot().len() == 2).await);
        assert_eq!(b.chain_snapshot(), a.chain_snapshot());
        assert!(b.pool_snapshot().is_empty());
        assert_eq!(b.balance_of(&b.address()), STARTING_BALANCE + 25);

        // a's own broadcasts came back to it and changed nothing
        assert_eq!(a.chain_snapshot().len(), 2);
    }

    #[test]
    fn adopt_pool_replaces_snapshot() {
        let node = lone_node();
        node.transact("someone", 1).unwrap();
        let tx = Transaction::new(&Wallet::new(), "x", 1).unwrap();
        node.adopt_pool(HashMap::from([(tx.id.clone(), tx.clone())]));
        assert_eq!(node.pool_snapshot(), HashMap::from([(tx.id.clone(), tx)]));
    }
}
