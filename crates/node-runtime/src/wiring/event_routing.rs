//! # Event Routing
//!
//! Maps bus events onto the subsystem that consumes them.
//!
//! ```text
//! PeerConnected / PeerDisconnected ──→ syncer (stream added / removed)
//! PeerMessageReceived ──────────────→ syncer (status / bulk pull)
//! BlockReceived ────────────────────→ block processor (submit)
//! TransactionCommitted ─────────────→ block processor (pending pool)
//! ```
//!
//! Outbound and sync-state events are produced by the core, not consumed by
//! it, and are ignored here.

use pov_02_block_processor::BlockProcessorApi;
use pov_03_peer_sync::{SyncHandle, SyncMessage};
use shared_bus::{BlockchainEvent, EventFilter, EventTopic, Subscription};
use shared_types::{short_hash, BlockOrigin, Hash, PeerMessage, PovBlock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where a bus event goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Sync(SyncMessage),
    Block { block: PovBlock, origin: BlockOrigin },
    TransactionAvailable(Hash),
    Ignore,
}

/// Topics the router subscribes to.
pub fn inbound_filter() -> EventFilter {
    EventFilter::topics(vec![EventTopic::Network, EventTopic::Ledger])
}

pub fn route(event: BlockchainEvent) -> Route {
    match event {
        BlockchainEvent::PeerConnected { peer_id } => {
            Route::Sync(SyncMessage::StreamAdded { peer_id })
        }
        BlockchainEvent::PeerDisconnected { peer_id } => {
            Route::Sync(SyncMessage::StreamRemoved { peer_id })
        }
        BlockchainEvent::PeerMessageReceived { peer_id, message } => match message {
            PeerMessage::Status(status) => Route::Sync(SyncMessage::Status { peer_id, status }),
            PeerMessage::BulkPullRequest(request) => {
                Route::Sync(SyncMessage::BulkPullRequest { peer_id, request })
            }
            PeerMessage::BulkPullResponse(response) => {
                Route::Sync(SyncMessage::BulkPullResponse { peer_id, response })
            }
        },
        BlockchainEvent::BlockReceived { block, origin, .. } => Route::Block { block, origin },
        BlockchainEvent::TransactionCommitted { tx_hash } => Route::TransactionAvailable(tx_hash),
        BlockchainEvent::SendToPeer { .. }
        | BlockchainEvent::Broadcast { .. }
        | BlockchainEvent::SyncStateChanged { .. } => Route::Ignore,
    }
}

/// Delivers routed events to the processor and the syncer.
pub struct EventRouter {
    processor: Arc<dyn BlockProcessorApi>,
    syncer: SyncHandle,
}

impl EventRouter {
    pub fn new(processor: Arc<dyn BlockProcessorApi>, syncer: SyncHandle) -> Self {
        Self { processor, syncer }
    }

    /// Route one event. Returns `false` once a consumer has stopped.
    pub async fn dispatch(&self, event: BlockchainEvent) -> bool {
        match route(event) {
            Route::Sync(message) => {
                let alive = self.syncer.deliver(message).await;
                if !alive {
                    debug!("Syncer stopped, dropping peer event");
                }
                alive
            }
            Route::Block { block, origin } => {
                let hash = block.hash();
                match self.processor.submit(block, origin).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(block = %short_hash(&hash), "Block submission failed: {}", e);
                        false
                    }
                }
            }
            Route::TransactionAvailable(tx_hash) => {
                match self.processor.notify_transaction_available(tx_hash).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(tx = %short_hash(&tx_hash), "Transaction notification failed: {}", e);
                        false
                    }
                }
            }
            Route::Ignore => true,
        }
    }

    /// Drain `subscription` until shutdown or until the bus closes.
    ///
    /// The subscription must be created before anything publishes the events
    /// it should see.
    pub fn spawn(
        self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    event = subscription.recv() => event,
                };
                match event {
                    Some(event) => {
                        self.dispatch(event).await;
                    }
                    None => break,
                }
            }
            info!("Event router stopped");
        })
    }
}
