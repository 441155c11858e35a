//! Syncer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timers and limits of the peer syncer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Peers required before syncing starts early.
    pub min_sync_peers: usize,
    /// Upper bound on waiting for `min_sync_peers`.
    pub wait_enough_peers_secs: u64,
    /// Status broadcast and peer liveness interval.
    pub check_peer_status_secs: u64,
    /// Sync-peer selection interval.
    pub check_sync_secs: u64,
    /// Local chain progress check interval.
    pub check_chain_secs: u64,
    /// A peer silent this long is marked bad.
    pub peer_dead_secs: u64,
    /// Syncing without any good peer this long fails the sync.
    pub peer_lost_secs: u64,
    /// Syncing without local height progress this long fails the sync.
    pub chain_stall_secs: u64,
    /// Minimum gap between locator requests to the same sync peer.
    pub request_cooldown_secs: u64,
    /// Blocks asked for per bulk pull.
    pub max_blocks_per_request: u32,
    /// Byte cap on one bulk-pull response.
    pub max_response_bytes: usize,
    /// Capacity of the inbound message channel.
    pub message_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_sync_peers: 1,
            wait_enough_peers_secs: 75,
            check_peer_status_secs: 30,
            check_sync_secs: 10,
            check_chain_secs: 1,
            peer_dead_secs: 600,
            peer_lost_secs: 600,
            chain_stall_secs: 1800,
            request_cooldown_secs: 15,
            max_blocks_per_request: 1000,
            max_response_bytes: 4 * 1024 * 1024,
            message_channel_capacity: 100,
        }
    }
}

impl SyncConfig {
    /// Short timers for tests.
    pub fn for_testing() -> Self {
        Self {
            wait_enough_peers_secs: 2,
            check_peer_status_secs: 5,
            check_sync_secs: 1,
            ..Self::default()
        }
    }

    pub fn wait_enough_peers(&self) -> Duration {
        Duration::from_secs(self.wait_enough_peers_secs)
    }

    pub fn check_peer_status_interval(&self) -> Duration {
        Duration::from_secs(self.check_peer_status_secs.max(1))
    }

    pub fn check_sync_interval(&self) -> Duration {
        Duration::from_secs(self.check_sync_secs.max(1))
    }

    pub fn check_chain_interval(&self) -> Duration {
        Duration::from_secs(self.check_chain_secs.max(1))
    }

    pub fn peer_dead_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_dead_secs)
    }

    pub fn peer_lost_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_lost_secs)
    }

    pub fn chain_stall_timeout(&self) -> Duration {
        Duration::from_secs(self.chain_stall_secs)
    }

    pub fn request_cooldown(&self) -> Duration {
        Duration::from_secs(self.request_cooldown_secs)
    }
}
