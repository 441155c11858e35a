use shared_types::{PeerId, U256};
use tokio::time::Instant;

/// Liveness of a peer as seen by the syncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    /// Connected, no status received yet.
    Init,
    /// Sent a status recently.
    Good,
    /// Silent for too long.
    Bad,
}

/// Snapshot of one connected peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPeer {
    pub peer_id: PeerId,
    pub height: u64,
    pub total_difficulty: U256,
    pub added_at: Instant,
    pub last_status_at: Option<Instant>,
    pub status: PeerStatus,
}

impl SyncPeer {
    pub fn new(peer_id: PeerId, now: Instant) -> Self {
        Self {
            peer_id,
            height: 0,
            total_difficulty: U256::zero(),
            added_at: now,
            last_status_at: None,
            status: PeerStatus::Init,
        }
    }

    pub fn is_good(&self) -> bool {
        self.status == PeerStatus::Good
    }

    /// Instant the peer was last heard from; peers that never sent a status
    /// count from when they connected.
    pub fn last_seen(&self) -> Instant {
        self.last_status_at.unwrap_or(self.added_at)
    }
}
