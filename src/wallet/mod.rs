pub mod balance;

use std::fmt;

use rand::rngs::OsRng;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use serde::Serialize;
use serde_json::json;

use crate::blockchain::Block;
use crate::error::{TransactionError, WalletError};
use crate::transaction::Transaction;
use crate::util::crypto_hash_bytes;

pub use balance::calculate_balance;

/// Balance every address starts with before any block credits it.
pub const STARTING_BALANCE: u64 = 1000;

/// A secp256k1 key pair plus a locally cached balance.
/// The address is the hex of the compressed public key.
pub struct Wallet {
    secp: Secp256k1<All>,
    secret_key: SecretKey,
    public_key: String,
    pub balance: u64,
}

impl Wallet {
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, pk) = secp.generate_keypair(&mut OsRng);
        Self::from_parts(secp, secret_key, pk)
    }

    /// Rebuild a wallet from a hex-encoded 32-byte secret key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(secret_hex.trim()).map_err(|_| WalletError::InvalidHex)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| WalletError::InvalidKey)?;
        let secp = Secp256k1::new();
        let pk = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self::from_parts(secp, secret_key, pk))
    }

    fn from_parts(secp: Secp256k1<All>, secret_key: SecretKey, pk: PublicKey) -> Self {
        Self {
            secp,
            secret_key,
            public_key: hex::encode(pk.serialize()),
            balance: STARTING_BALANCE,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Hex-encoded DER signature over `crypto_hash(data)`.
    pub fn sign<T: Serialize>(&self, data: &T) -> String {
        let msg = Message::from_digest(crypto_hash_bytes(&[json!(data)]));
        let sig = self.secp.sign_ecdsa(&msg, &self.secret_key);
        hex::encode(&sig.serialize_der()[..])
    }

    /// Create a transfer from this wallet. When `chain` is given the cached
    /// balance is recomputed from it first.
    pub fn create_transaction(
        &mut self,
        recipient: &str,
        amount: u64,
        chain: Option<&[Block]>,
    ) -> Result<Transaction, TransactionError> {
        if let Some(chain) = chain {
            self.balance = calculate_balance(chain, &self.public_key);
        }
        if amount > self.balance {
            return Err(TransactionError::InsufficientFunds {
                amount,
                balance: self.balance,
            });
        }
        Transaction::new(self, recipient, amount)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("public_key", &self.public_key)
            .field("balance", &self.balance)
            .finish_non_exhaustive()
    }
}

/// Verify a hex DER signature over `crypto_hash(data)` against a hex
/// compressed public key. Any decoding failure yields `false`.
pub fn verify_signature<T: Serialize>(public_key_hex: &str, data: &T, sig_hex: &str) -> bool {
    let secp = Secp256k1::verification_only();

    let Ok(pk_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(pk) = PublicKey::from_slice(&pk_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(sig) = Signature::from_der(&sig_bytes) else {
        return false;
    };

    let msg = Message::from_digest(crypto_hash_bytes(&[json!(data)]));
    secp.verify_ecdsa(&msg, &sig, &pk).is_ok()
}
