use std::collections::HashSet;

use log::{error, info};

use super::Block;
use crate::error::{ChainError, DataViolation};
use crate::transaction::{Transaction, TxKind};
use crate::wallet::calculate_balance;

/// In-memory chain of Proof-of-Work blocks, rooted at the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        // the chain is never empty: it starts at genesis and is only
        // replaced by longer valid chains
        &self.chain[self.chain.len() - 1]
    }

    /// Mine and append a new block on the current tip. The data is not
    /// validated: a node trusts the blocks it mines itself.
    pub fn add_block(&mut self, data: Vec<Transaction>) -> &Block {
        let block = Block::mine(self.last_block(), data);
        self.chain.push(block);
        self.last_block()
    }

    /// Commit a block that was mined away from the chain lock. Fails if the
    /// tip moved in the meantime.
    pub fn append_mined_block(&mut self, block: Block) -> Result<(), ChainError> {
        let tip = self.last_block();
        if block.last_hash != tip.hash {
            return Err(ChainError::StaleTip);
        }
        if !Self::is_valid_link(tip, &block) {
            return Err(ChainError::InvalidBlock);
        }
        self.chain.push(block);
        Ok(())
    }

    /// Fork choice: adopt `candidate` only if it is strictly longer and
    /// valid. `on_success` runs before the swap.
    pub fn replace_chain<F>(
        &mut self,
        candidate: Vec<Block>,
        validate_transactions: bool,
        on_success: F,
    ) -> Result<(), ChainError>
    where
        F: FnOnce(&[Block]),
    {
        if candidate.len() <= self.chain.len() {
            error!("The incoming chain must be longer");
            return Err(ChainError::MustBeLonger);
        }
        if !Self::is_valid_chain(&candidate) {
            error!("The incoming chain must be valid");
            return Err(ChainError::MustBeValid);
        }
        if validate_transactions {
            if let Err(violation) = Self::check_transaction_data(&candidate) {
                error!("The incoming chain has invalid data: {violation}");
                return Err(ChainError::InvalidData(violation));
            }
        }

        on_success(&candidate);

        info!(
            "CHAIN - replacing chain: {} -> {} blocks",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        Ok(())
    }

    /// Structural validity: genesis, linkage, hash integrity, Proof-of-Work
    /// and a difficulty step of at most one per block.
    pub fn is_valid_chain(chain: &[Block]) -> bool {
        let Some(first) = chain.first() else {
            return false;
        };
        if *first != Block::genesis() {
            return false;
        }
        chain
            .windows(2)
            .all(|pair| Self::is_valid_link(&pair[0], &pair[1]))
    }

    fn is_valid_link(prev: &Block, current: &Block) -> bool {
        if current.last_hash != prev.hash {
            return false;
        }
        if current.hash != current.compute_hash() {
            return false;
        }
        if !current.meets_difficulty() {
            return false;
        }
        prev.difficulty.abs_diff(current.difficulty) <= 1
    }

    pub fn valid_transaction_data(chain: &[Block]) -> bool {
        match Self::check_transaction_data(chain) {
            Ok(()) => true,
            Err(violation) => {
                error!("{violation}");
                false
            }
        }
    }

    /// Economic validity of every block after genesis. Input amounts are
    /// checked against the balance the chain itself records before the
    /// block, so a starting balance cannot be inflated. Returns the first
    /// violation found.
    pub fn check_transaction_data(chain: &[Block]) -> Result<(), DataViolation> {
        for (i, block) in chain.iter().enumerate().skip(1) {
            let mut ids = HashSet::new();
            let mut senders = HashSet::new();
            let mut reward_count = 0usize;

            for tx in &block.data {
                if !ids.insert(tx.id.as_str()) {
                    return Err(DataViolation::DuplicateTransaction {
                        block: i,
                        id: tx.id.clone(),
                    });
                }

                match tx.kind {
                    TxKind::Reward => {
                        reward_count += 1;
                        if reward_count > 1 {
                            return Err(DataViolation::TooManyRewards { block: i });
                        }
                        if !tx.is_valid_reward() {
                            return Err(DataViolation::InvalidReward { block: i });
                        }
                    }
                    TxKind::Transfer => {
                        if let Err(source) = tx.validate() {
                            return Err(DataViolation::InvalidTransaction {
                                block: i,
                                id: tx.id.clone(),
                                source,
                            });
                        }

                        let true_balance = calculate_balance(&chain[..i], &tx.input.address);
                        if tx.input.amount != true_balance {
                            return Err(DataViolation::InvalidInputAmount {
                                block: i,
                                id: tx.id.clone(),
                                expected: true_balance,
                                actual: tx.input.amount,
                            });
                        }

                        if !senders.insert(tx.input.address.as_str()) {
                            return Err(DataViolation::DuplicateSender {
                                block: i,
                                address: tx.input.address.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Difficulty of the current tip.
    pub fn difficulty(&self) -> u32 {
        self.last_block().difficulty
    }
}
