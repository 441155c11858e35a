//! # In-Memory Chain Store
//!
//! Stores every accepted block on any branch, tracks cumulative difficulty
//! and keeps the canonical chain pointed at the heaviest tip.

use parking_lot::RwLock;
use pov_01_state_trie::{InMemoryTrieDb, StateTrie, TrieDatabase};
use pov_02_block_processor::ChainStore;
use shared_types::{short_hash, ChainError, ChainReader, Hash, PovBlock, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Locator entries taken one block apart before the step starts doubling.
const LOCATOR_DENSE_ENTRIES: usize = 10;

#[derive(Debug, Clone)]
struct StoredBlock {
    block: PovBlock,
    total_difficulty: U256,
}

#[derive(Debug, Default)]
struct ChainIndex {
    blocks: HashMap<Hash, StoredBlock>,
    /// Canonical hash per height, genesis first.
    canonical: Vec<Hash>,
}

impl ChainIndex {
    fn is_canonical(&self, hash: &Hash, height: u64) -> bool {
        self.canonical.get(height as usize) == Some(hash)
    }

    fn tip(&self) -> Option<&StoredBlock> {
        self.canonical.last().and_then(|hash| self.blocks.get(hash))
    }

    /// Ancestor of `block` at `height`, following parent links until the
    /// canonical chain is reached.
    fn ancestor_at(&self, block: &PovBlock, height: u64) -> Option<PovBlock> {
        let mut current = block.clone();
        while current.height() > height {
            if self.is_canonical(&current.hash(), current.height()) {
                let hash = self.canonical.get(height as usize)?;
                return self.blocks.get(hash).map(|s| s.block.clone());
            }
            current = self.blocks.get(&current.previous())?.block.clone();
        }
        Some(current)
    }
}

/// Reference chain store backed by hash maps.
///
/// Post-state tries are handed to the shared trie database on insert so the
/// verifier can load them as parent state for the next block.
pub struct InMemoryChain {
    genesis: PovBlock,
    index: RwLock<ChainIndex>,
    tries: Arc<InMemoryTrieDb>,
}

impl InMemoryChain {
    /// Create a chain containing only `genesis`.
    pub fn new(genesis: PovBlock, tries: Arc<InMemoryTrieDb>) -> Self {
        let hash = genesis.hash();
        let mut index = ChainIndex::default();
        index.blocks.insert(
            hash,
            StoredBlock {
                block: genesis.clone(),
                total_difficulty: genesis.header.work(),
            },
        );
        index.canonical.push(hash);

        Self {
            genesis,
            index: RwLock::new(index),
            tries,
        }
    }

    pub fn tries(&self) -> &Arc<InMemoryTrieDb> {
        &self.tries
    }

    /// Height of the canonical tip.
    pub fn height(&self) -> u64 {
        self.index.read().canonical.len().saturating_sub(1) as u64
    }

    /// Number of stored blocks across all branches.
    pub fn block_count(&self) -> usize {
        self.index.read().blocks.len()
    }

    /// Point the canonical chain at `tip`, replacing the old branch down to
    /// the common ancestor. Returns the number of blocks rolled back.
    fn set_canonical_tip(index: &mut ChainIndex, tip: &PovBlock) -> usize {
        let mut branch = Vec::new();
        let mut current = tip.clone();
        while !index.is_canonical(&current.hash(), current.height()) {
            branch.push(current.hash());
            match index.blocks.get(&current.previous()) {
                Some(parent) => current = parent.block.clone(),
                None => break,
            }
        }

        let fork_height = current.height() as usize;
        let rolled_back = index.canonical.len().saturating_sub(fork_height + 1);
        index.canonical.truncate(fork_height + 1);
        index.canonical.extend(branch.into_iter().rev());
        rolled_back
    }
}

impl ChainReader for InMemoryChain {
    fn has_block(&self, hash: &Hash, _height: u64) -> bool {
        self.index.read().blocks.contains_key(hash)
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<PovBlock> {
        self.index.read().blocks.get(hash).map(|s| s.block.clone())
    }

    fn block_by_height(&self, height: u64) -> Result<PovBlock, ChainError> {
        let index = self.index.read();
        index
            .canonical
            .get(height as usize)
            .and_then(|hash| index.blocks.get(hash))
            .map(|s| s.block.clone())
            .ok_or(ChainError::BlockNotFound { height })
    }

    fn genesis_block(&self) -> PovBlock {
        self.genesis.clone()
    }

    fn latest_block(&self) -> Result<PovBlock, ChainError> {
        self.index
            .read()
            .tip()
            .map(|s| s.block.clone())
            .ok_or(ChainError::EmptyChain)
    }

    fn total_difficulty(&self, hash: &Hash) -> Option<U256> {
        self.index.read().blocks.get(hash).map(|s| s.total_difficulty)
    }

    fn locate_best_block(&self, locators: &[Hash]) -> Option<PovBlock> {
        let index = self.index.read();
        locators.iter().find_map(|hash| {
            let stored = index.blocks.get(hash)?;
            index
                .is_canonical(hash, stored.block.height())
                .then(|| stored.block.clone())
        })
    }

    fn block_locator(&self, from: Option<Hash>) -> Vec<Hash> {
        let index = self.index.read();
        let start = match from {
            Some(hash) => index.blocks.get(&hash).map(|s| s.block.clone()),
            None => index.tip().map(|s| s.block.clone()),
        };
        let Some(mut current) = start else {
            return Vec::new();
        };

        let mut locator = Vec::new();
        let mut step = 1u64;
        loop {
            locator.push(current.hash());
            if current.height() == 0 {
                break;
            }
            if locator.len() >= LOCATOR_DENSE_ENTRIES {
                step = step.saturating_mul(2);
            }
            let target = current.height().saturating_sub(step);
            match index.ancestor_at(&current, target) {
                Some(ancestor) => current = ancestor,
                None => break,
            }
        }
        locator
    }
}

impl ChainStore for InMemoryChain {
    fn insert_block(&self, block: &PovBlock, state_trie: StateTrie) -> Result<(), ChainError> {
        let hash = block.hash();
        let height = block.height();

        let mut index = self.index.write();
        if index.blocks.contains_key(&hash) {
            return Ok(());
        }
        let parent_td = index
            .blocks
            .get(&block.previous())
            .map(|parent| parent.total_difficulty)
            .ok_or(ChainError::UnknownParent { height })?;

        self.tries
            .put_trie(&state_trie)
            .map_err(|e| ChainError::StateError(e.to_string()))?;

        let total_difficulty = parent_td.saturating_add(block.header.work());
        index.blocks.insert(
            hash,
            StoredBlock {
                block: block.clone(),
                total_difficulty,
            },
        );

        let tip_td = index.tip().map(|s| s.total_difficulty).unwrap_or_default();
        if total_difficulty > tip_td {
            let rolled_back = Self::set_canonical_tip(&mut index, block);
            if rolled_back > 0 {
                info!(
                    "[pov-02] Chain reorganized to {} at height {} ({} blocks rolled back)",
                    short_hash(&hash),
                    height,
                    rolled_back
                );
            }
        } else {
            debug!(
                height,
                hash = %short_hash(&hash),
                "[pov-02] Stored side-branch block"
            );
        }
        Ok(())
    }
}
