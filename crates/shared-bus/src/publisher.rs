//! # Event Publisher
//!
//! Producers (transport, ledger, syncer) only ever publish; they hold an
//! `Arc<dyn EventPublisher>`. The runtime keeps the concrete
//! [`InMemoryEventBus`] so it can also hand out subscriptions.

use crate::events::{BlockchainEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Publishing side of the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`, returning how many subscriptions it reached.
    ///
    /// Events published while nobody is subscribed are lost.
    async fn publish(&self, event: BlockchainEvent) -> usize;
}

/// Broadcast-backed bus. Every subscription sees every event published
/// after it subscribed and keeps the ones its filter accepts.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<BlockchainEvent>,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the backlog a slow subscription may accumulate before
    /// it starts losing the oldest events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "Bus subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BlockchainEvent) -> usize {
        let topic = event.topic();
        match self.sender.send(event) {
            Ok(reached) => {
                trace!(?topic, reached, "Event published");
                reached
            }
            Err(_) => {
                debug!(?topic, "Event dropped, no subscriptions");
                0
            }
        }
    }
}
