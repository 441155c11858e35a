//! # Syncer Outbound Adapters
//!
//! Connect the peer syncer's ports to the shared bus (peer traffic, state
//! announcements) and to the block processor (pulled blocks).

use async_trait::async_trait;
use pov_02_block_processor::{BlockProcessorApi, BlockProcessorHandle};
use pov_03_peer_sync::{BlockSink, PeerMessenger};
use shared_bus::{BlockchainEvent, EventPublisher};
use shared_types::{BlockOrigin, PeerId, PeerMessage, PovBlock, SyncState};
use std::sync::Arc;
use tracing::trace;

/// `PeerMessenger` that turns sends into `Outbound` bus events for the
/// transport to deliver.
pub struct BusMessenger {
    bus: Arc<dyn EventPublisher>,
}

impl BusMessenger {
    pub fn new(bus: Arc<dyn EventPublisher>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl PeerMessenger for BusMessenger {
    async fn send_to_peer(&self, peer_id: &PeerId, message: PeerMessage) {
        trace!(peer = %peer_id, kind = message.kind(), "[pov-03] Sending to peer");
        self.bus
            .publish(BlockchainEvent::SendToPeer {
                peer_id: peer_id.clone(),
                message,
            })
            .await;
    }

    async fn broadcast(&self, message: PeerMessage) {
        trace!(kind = message.kind(), "[pov-03] Broadcasting");
        self.bus.publish(BlockchainEvent::Broadcast { message }).await;
    }

    async fn publish_sync_state(&self, state: SyncState) {
        self.bus
            .publish(BlockchainEvent::SyncStateChanged { state })
            .await;
    }
}

/// `BlockSink` feeding pulled blocks into the block processor.
pub struct ProcessorBlockSink {
    processor: BlockProcessorHandle,
}

impl ProcessorBlockSink {
    pub fn new(processor: BlockProcessorHandle) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl BlockSink for ProcessorBlockSink {
    async fn submit_block(&self, block: PovBlock, origin: BlockOrigin) -> Result<(), String> {
        self.processor
            .submit(block, origin)
            .await
            .map_err(|e| e.to_string())
    }
}
