use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blockchain::MINING_REWARD;
use crate::error::TransactionError;
use crate::wallet::{Wallet, verify_signature};

/// Sentinel input address of miner-reward transactions.
pub const REWARD_ADDRESS: &str = "*authorized-reward*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Transfer,
    Reward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub timestamp: i64,
    /// Sender balance when the transaction was created.
    pub amount: u64,
    /// Sender public key (hex), or [`REWARD_ADDRESS`].
    pub address: String,
    /// Hex-encoded DER ECDSA signature over the output map.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TxKind,
    pub input: TxInput,
    pub output_map: BTreeMap<String, u64>,
}

impl Transaction {
    /// Transfer `amount` from `sender` to `recipient`, the rest going back to
    /// the sender as change.
    pub fn new(sender: &Wallet, recipient: &str, amount: u64) -> Result<Self, TransactionError> {
        if recipient == sender.public_key() {
            return Err(TransactionError::SelfTransfer);
        }
        if amount > sender.balance {
            return Err(TransactionError::InsufficientFunds {
                amount,
                balance: sender.balance,
            });
        }

        let mut output_map = BTreeMap::new();
        output_map.insert(recipient.to_string(), amount);
        output_map.insert(sender.public_key().to_string(), sender.balance - amount);

        let input = Self::create_input(sender, sender.balance, &output_map);
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kind: TxKind::Transfer,
            input,
            output_map,
        })
    }

    /// Miner reward for one block.
    pub fn reward(miner_address: &str) -> Self {
        let mut output_map = BTreeMap::new();
        output_map.insert(miner_address.to_string(), MINING_REWARD);
        Self {
            id: Uuid::new_v4().to_string(),
            kind: TxKind::Reward,
            input: TxInput {
                timestamp: Utc::now().timestamp_millis(),
                amount: MINING_REWARD,
                address: REWARD_ADDRESS.to_string(),
                signature: String::new(),
            },
            output_map,
        }
    }

    fn create_input(sender: &Wallet, amount: u64, output_map: &BTreeMap<String, u64>) -> TxInput {
        TxInput {
            timestamp: Utc::now().timestamp_millis(),
            amount,
            address: sender.public_key().to_string(),
            signature: sender.sign(output_map),
        }
    }

    /// Batch one more transfer into this pending transaction, paid out of the
    /// sender's change. The input amount is kept and the outputs re-signed.
    /// On error the transaction is left as it was.
    pub fn update(
        &mut self,
        sender: &Wallet,
        recipient: &str,
        amount: u64,
    ) -> Result<(), TransactionError> {
        if self.kind != TxKind::Transfer || self.input.address != sender.public_key() {
            return Err(TransactionError::Invalid("only the sender can update a transfer"));
        }
        if recipient == sender.public_key() {
            return Err(TransactionError::SelfTransfer);
        }
        let change = self
            .output_map
            .get(sender.public_key())
            .copied()
            .unwrap_or(0);
        if amount > change {
            return Err(TransactionError::InsufficientFunds {
                amount,
                balance: change,
            });
        }

        *self.output_map.entry(recipient.to_string()).or_insert(0) += amount;
        self.output_map
            .insert(sender.public_key().to_string(), change - amount);
        self.input = Self::create_input(sender, self.input.amount, &self.output_map);
        Ok(())
    }

    pub fn total_output_amount(&self) -> u128 {
        self.output_map.values().map(|v| *v as u128).sum()
    }

    /// Output sum and signature checks for transfers. Reward transactions are
    /// only accepted by block rules, never through this path.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.is_reward() {
            return Err(TransactionError::Invalid("reward transactions are not transferable"));
        }
        if self.total_output_amount() != self.input.amount as u128 {
            return Err(TransactionError::Invalid("outputs do not sum to the input amount"));
        }
        if !verify_signature(&self.input.address, &self.output_map, &self.input.signature) {
            return Err(TransactionError::Invalid("signature does not verify"));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn is_reward(&self) -> bool {
        self.kind == TxKind::Reward
    }

    /// A well-formed reward: sentinel input, one output of exactly
    /// [`MINING_REWARD`].
    pub fn is_valid_reward(&self) -> bool {
        self.is_reward()
            && self.input.address == REWARD_ADDRESS
            && self.output_map.len() == 1
            && self.output_map.values().all(|v| *v == MINING_REWARD)
    }
}
