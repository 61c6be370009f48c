use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{Envelope, Transport};
use crate::node::Node;

const HUB_CAPACITY: usize = 256;

/// In-process bus: every subscriber sees every envelope, including the
/// publisher's own.
#[derive(Debug, Clone)]
pub struct LocalHub {
    sender: broadcast::Sender<Envelope>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Feed every envelope on the hub to `node` until the hub closes.
    pub fn spawn_listener(&self, node: Arc<Node>) -> JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => node.handle_message(envelope),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("PUBSUB - listener lagged, {n} envelopes dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Transport for LocalHub {
    fn publish(&self, envelope: Envelope) {
        let channel = envelope.message.channel();
        // Err only means nobody is subscribed right now
        if self.sender.send(envelope).is_err() {
            debug!("PUBSUB - no subscribers for {channel}");
        }
    }
}
