//! Pending pool: structurally valid blocks waiting for ledger transactions.

use super::BlockSource;
use shared_types::Hash;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct PendingBlock {
    source: BlockSource,
    outstanding: HashSet<Hash>,
    expires_at: Instant,
}

/// Blocks keyed by hash plus a reverse index from transaction hash to every
/// block waiting on it. Any number of blocks may wait on one transaction.
#[derive(Debug)]
pub struct PendingPool {
    capacity: usize,
    ttl: Duration,
    blocks: HashMap<Hash, PendingBlock>,
    waiters: HashMap<Hash, Vec<Hash>>,
}

impl PendingPool {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            blocks: HashMap::new(),
            waiters: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, block_hash: &Hash) -> bool {
        self.blocks.contains_key(block_hash)
    }

    /// Whether any block is waiting on `tx_hash`.
    #[cfg(test)]
    pub fn is_awaited(&self, tx_hash: &Hash) -> bool {
        self.waiters.contains_key(tx_hash)
    }

    /// Transactions a pending block still needs.
    #[cfg(test)]
    pub fn outstanding(&self, block_hash: &Hash) -> Option<&HashSet<Hash>> {
        self.blocks.get(block_hash).map(|p| &p.outstanding)
    }

    /// Register `source` as waiting for `missing`. A block already present is
    /// replaced. Returns the hashes evicted to make room.
    pub fn insert(&mut self, source: BlockSource, missing: HashSet<Hash>, now: Instant) -> Vec<Hash> {
        let block_hash = source.hash();
        self.remove(&block_hash);

        let mut evicted = self.remove_expired(now);
        while self.capacity > 0 && self.blocks.len() >= self.capacity {
            let Some(oldest) = self
                .blocks
                .iter()
                .min_by_key(|(_, pending)| pending.expires_at)
                .map(|(hash, _)| *hash)
            else {
                break;
            };
            self.remove(&oldest);
            evicted.push(oldest);
        }

        for tx_hash in &missing {
            self.waiters.entry(*tx_hash).or_default().push(block_hash);
        }
        self.blocks.insert(
            block_hash,
            PendingBlock {
                source,
                outstanding: missing,
                expires_at: now + self.ttl,
            },
        );
        evicted
    }

    /// Mark `tx_hash` as available. Every block whose outstanding set became
    /// empty is removed and returned, in registration order.
    pub fn transaction_available(&mut self, tx_hash: &Hash) -> Vec<BlockSource> {
        let Some(waiting) = self.waiters.remove(tx_hash) else {
            return Vec::new();
        };

        let mut ready = Vec::new();
        for block_hash in waiting {
            if let Some(pending) = self.blocks.get_mut(&block_hash) {
                pending.outstanding.remove(tx_hash);
                if pending.outstanding.is_empty() {
                    ready.push(block_hash);
                }
            }
        }

        ready
            .into_iter()
            .filter_map(|hash| self.blocks.remove(&hash))
            .map(|pending| pending.source)
            .collect()
    }

    /// Remove a block and unlink it from every transaction it waited on.
    pub fn remove(&mut self, block_hash: &Hash) -> Option<BlockSource> {
        let pending = self.blocks.remove(block_hash)?;
        for tx_hash in &pending.outstanding {
            if let Some(blocks) = self.waiters.get_mut(tx_hash) {
                blocks.retain(|h| h != block_hash);
                if blocks.is_empty() {
                    self.waiters.remove(tx_hash);
                }
            }
        }
        Some(pending.source)
    }

    pub fn remove_expired(&mut self, now: Instant) -> Vec<Hash> {
        let expired: Vec<Hash> = self
            .blocks
            .iter()
            .filter(|(_, pending)| pending.expires_at <= now)
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &expired {
            self.remove(hash);
        }
        expired
    }
}
