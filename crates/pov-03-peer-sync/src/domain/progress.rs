use shared_types::{PeerId, SyncState};
use tokio::time::Instant;

/// Mutable sync bookkeeping, guarded by one mutex in the service.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    pub state: SyncState,
    /// First height this sync session needs.
    pub from_height: u64,
    /// Height of the sync peer when it was selected.
    pub to_height: u64,
    /// Local height at the last chain check that saw progress.
    pub current_height: u64,
    pub last_progress_at: Instant,
    pub sync_peer: Option<PeerId>,
    /// Next height requested from the sync peer.
    pub sync_height: u64,
    /// When the last good peer disappeared.
    pub sync_peer_lost_at: Option<Instant>,
    pub last_request_at: Option<Instant>,
}

impl SyncProgress {
    pub fn new(now: Instant) -> Self {
        Self {
            state: SyncState::NotStarted,
            from_height: 0,
            to_height: 0,
            current_height: 0,
            last_progress_at: now,
            sync_peer: None,
            sync_height: 0,
            sync_peer_lost_at: None,
            last_request_at: None,
        }
    }

    /// Move to `next`; returns it if this is an actual transition.
    pub fn transition(&mut self, next: SyncState) -> Option<SyncState> {
        if self.state == next {
            return None;
        }
        self.state = next;
        Some(next)
    }
}
