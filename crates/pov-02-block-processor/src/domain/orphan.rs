//! Orphan pool: blocks whose parent has not been seen yet.

use super::BlockSource;
use shared_types::Hash;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// A buffered block waiting for its parent.
#[derive(Debug)]
pub struct OrphanBlock {
    pub source: BlockSource,
    pub expires_at: Instant,
}

/// Bounded orphan store indexed by block hash and by parent hash.
///
/// Both maps are mutated together; every hash in `by_parent` refers to an
/// entry of `orphans`.
#[derive(Debug)]
pub struct OrphanPool {
    capacity: usize,
    ttl: Duration,
    orphans: HashMap<Hash, OrphanBlock>,
    by_parent: HashMap<Hash, Vec<Hash>>,
}

impl OrphanPool {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            orphans: HashMap::new(),
            by_parent: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.orphans.contains_key(hash)
    }

    /// Hashes of orphans waiting on `parent`.
    #[cfg(test)]
    pub fn children_of(&self, parent: &Hash) -> &[Hash] {
        self.by_parent.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buffer `source`, first dropping expired orphans and then, if still
    /// full, the orphan closest to expiry. Returns the hashes evicted.
    pub fn insert(&mut self, source: BlockSource, now: Instant) -> Vec<Hash> {
        let hash = source.hash();
        if self.orphans.contains_key(&hash) {
            return Vec::new();
        }

        let mut evicted = self.remove_expired(now);

        while self.capacity > 0 && self.orphans.len() >= self.capacity {
            let Some(oldest) = self.earliest_expiration() else {
                break;
            };
            self.remove(&oldest);
            evicted.push(oldest);
        }

        let parent = source.block.previous();
        self.orphans.insert(
            hash,
            OrphanBlock {
                source,
                expires_at: now + self.ttl,
            },
        );
        self.by_parent.entry(parent).or_default().push(hash);
        evicted
    }

    /// Remove one orphan, keeping the parent index consistent.
    pub fn remove(&mut self, hash: &Hash) -> Option<OrphanBlock> {
        let orphan = self.orphans.remove(hash)?;
        let parent = orphan.source.block.previous();
        if let Some(siblings) = self.by_parent.get_mut(&parent) {
            siblings.retain(|h| h != hash);
            if siblings.is_empty() {
                self.by_parent.remove(&parent);
            }
        }
        Some(orphan)
    }

    /// Detach every orphan whose parent is `parent`, in arrival order.
    pub fn take_children(&mut self, parent: &Hash) -> Vec<BlockSource> {
        let Some(children) = self.by_parent.remove(parent) else {
            return Vec::new();
        };
        children
            .into_iter()
            .filter_map(|hash| self.orphans.remove(&hash))
            .map(|orphan| orphan.source)
            .collect()
    }

    /// Drop every orphan whose expiration has passed.
    pub fn remove_expired(&mut self, now: Instant) -> Vec<Hash> {
        let expired: Vec<Hash> = self
            .orphans
            .iter()
            .filter(|(_, orphan)| orphan.expires_at <= now)
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &expired {
            self.remove(hash);
        }
        expired
    }

    fn earliest_expiration(&self) -> Option<Hash> {
        self.orphans
            .iter()
            .min_by_key(|(_, orphan)| orphan.expires_at)
            .map(|(hash, _)| *hash)
    }
}
