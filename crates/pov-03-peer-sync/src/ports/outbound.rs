//! Outbound ports (dependencies the syncer requires)

use async_trait::async_trait;
use shared_types::{BlockOrigin, PeerId, PeerMessage, PovBlock, SyncState};

/// Sends messages to peers and announces sync state changes.
#[async_trait]
pub trait PeerMessenger: Send + Sync {
    async fn send_to_peer(&self, peer_id: &PeerId, message: PeerMessage);

    async fn broadcast(&self, message: PeerMessage);

    async fn publish_sync_state(&self, state: SyncState);
}

/// Where pulled blocks are handed for admission.
#[async_trait]
pub trait BlockSink: Send + Sync {
    async fn submit_block(&self, block: PovBlock, origin: BlockOrigin) -> Result<(), String>;
}
