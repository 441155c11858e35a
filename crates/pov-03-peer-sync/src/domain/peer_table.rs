//! Connected peers ranked by total difficulty.

use super::{PeerStatus, SyncPeer};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use shared_types::{PeerId, U256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Concurrent peer table. Readers get cloned snapshots.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<PeerId, SyncPeer>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected peer. Re-adding keeps the existing entry.
    pub fn add(&self, peer_id: PeerId, now: Instant) -> bool {
        let mut peers = self.peers.write();
        if peers.contains_key(&peer_id) {
            return false;
        }
        peers.insert(peer_id.clone(), SyncPeer::new(peer_id, now));
        true
    }

    pub fn remove(&self, peer_id: &PeerId) -> Option<SyncPeer> {
        self.peers.write().remove(peer_id)
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.read().contains_key(peer_id)
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<SyncPeer> {
        self.peers.read().get(peer_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.peers.read().len()
    }

    /// Record a status message. Unknown peers are ignored.
    pub fn apply_status(&self, peer_id: &PeerId, height: u64, td: U256, now: Instant) -> bool {
        let mut peers = self.peers.write();
        let Some(peer) = peers.get_mut(peer_id) else {
            return false;
        };
        peer.height = height;
        peer.total_difficulty = td;
        peer.last_status_at = Some(now);
        peer.status = PeerStatus::Good;
        true
    }

    /// Mark peers silent for `timeout` as bad; returns the newly marked ones.
    pub fn mark_stale(&self, now: Instant, timeout: Duration) -> Vec<PeerId> {
        let mut marked = Vec::new();
        for peer in self.peers.write().values_mut() {
            let silent_for = now.saturating_duration_since(peer.last_seen());
            if peer.status != PeerStatus::Bad && silent_for >= timeout {
                peer.status = PeerStatus::Bad;
                marked.push(peer.peer_id.clone());
            }
        }
        marked
    }

    /// Good peers sorted by total difficulty, heaviest first. Ties are broken
    /// by peer id so the order is stable.
    fn good_peers_by_td(&self) -> Vec<SyncPeer> {
        let mut good: Vec<SyncPeer> = self
            .peers
            .read()
            .values()
            .filter(|p| p.is_good())
            .cloned()
            .collect();
        good.sort_by(|a, b| {
            b.total_difficulty
                .cmp(&a.total_difficulty)
                .then_with(|| a.peer_id.cmp(&b.peer_id))
        });
        good
    }

    /// The good peer with the highest total difficulty.
    pub fn best_peer(&self) -> Option<SyncPeer> {
        self.good_peers_by_td().into_iter().next()
    }

    /// Up to `limit` good peers, heaviest first.
    pub fn best_peers(&self, limit: usize) -> Vec<SyncPeer> {
        let mut peers = self.good_peers_by_td();
        peers.truncate(limit);
        peers
    }

    /// Up to `limit` good peers in random order.
    pub fn random_peers(&self, limit: usize) -> Vec<SyncPeer> {
        let good = self.good_peers_by_td();
        good.choose_multiple(&mut rand::thread_rng(), limit)
            .cloned()
            .collect()
    }

    /// A sample spanning the TD range: lowest, median and highest good peer.
    pub fn locator_peers(&self) -> Vec<SyncPeer> {
        let mut peers = self.good_peers_by_td();
        peers.reverse();
        if peers.len() <= 3 {
            return peers;
        }
        let last = peers.len() - 1;
        vec![
            peers[0].clone(),
            peers[peers.len() / 2].clone(),
            peers[last].clone(),
        ]
    }
}
