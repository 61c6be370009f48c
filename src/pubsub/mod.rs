//! Broadcast replication between nodes.
//!
//! Two logical channels: `BLOCKCHAIN` carries a node's full chain and
//! `TRANSACTION` a single pending transaction. Every envelope is tagged with
//! the publishing node's id so that a node can recognise its own messages
//! when the transport echoes them back.

pub mod http;
pub mod local;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blockchain::Block;
use crate::transaction::Transaction;

pub use http::HttpPeers;
pub use local::LocalHub;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Blockchain,
    Transaction,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Blockchain => write!(f, "BLOCKCHAIN"),
            Channel::Transaction => write!(f, "TRANSACTION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Blockchain(Vec<Block>),
    Transaction(Transaction),
}

impl Message {
    pub fn channel(&self) -> Channel {
        match self {
            Message::Blockchain(_) => Channel::Blockchain,
            Message::Transaction(_) => Channel::Transaction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: Uuid,
    #[serde(flatten)]
    pub message: Message,
}

/// Fire-and-forget publication. Implementations must not block the caller
/// on delivery and report failures through logging only.
pub trait Transport: Send + Sync {
    fn publish(&self, envelope: Envelope);
}

/// A node's publishing handle.
#[derive(Clone)]
pub struct PubSub {
    origin: Uuid,
    transport: Arc<dyn Transport>,
}

impl PubSub {
    pub fn new(origin: Uuid, transport: Arc<dyn Transport>) -> Self {
        Self { origin, transport }
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn is_own(&self, envelope: &Envelope) -> bool {
        envelope.origin == self.origin
    }

    pub fn broadcast_chain(&self, chain: &[Block]) {
        self.publish(Message::Blockchain(chain.to_vec()));
    }

    pub fn broadcast_transaction(&self, tx: &Transaction) {
        self.publish(Message::Transaction(tx.clone()));
    }

    fn publish(&self, message: Message) {
        self.transport.publish(Envelope {
            origin: self.origin,
            message,
        });
    }
}

impl fmt::Debug for PubSub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSub")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Drops every envelope. For nodes running without peers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn publish(&self, _envelope: Envelope) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    #[test]
    fn envelope_wire_format() {
        let envelope = Envelope {
            origin: Uuid::new_v4(),
            message: Message::Blockchain(vec![Block::genesis()]),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["channel"], "BLOCKCHAIN");
        assert_eq!(value["message"][0]["hash"], "hash-one");
        assert_eq!(value["origin"], envelope.origin.to_string());

        let back: Envelope = serde_json::from_value(value).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn transaction_envelope_channel() {
        let tx = Transaction::reward(Wallet::new().public_key());
        let message = Message::Transaction(tx);
        assert_eq!(message.channel(), Channel::Transaction);
        assert_eq!(message.channel().to_string(), "TRANSACTION");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["channel"], "TRANSACTION");
    }

    #[test]
    fn recognises_own_envelopes() {
        let pubsub = PubSub::new(Uuid::new_v4(), Arc::new(NoopTransport));
        let own = Envelope {
            origin: pubsub.origin(),
            message: Message::Blockchain(Vec::new()),
        };
        let foreign = Envelope {
            origin: Uuid::new_v4(),
            ..own.clone()
        };
        assert!(pubsub.is_own(&own));
        assert!(!pubsub.is_own(&foreign));
    }
}
