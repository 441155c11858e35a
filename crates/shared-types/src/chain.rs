//! # Chain Reader Port
//!
//! Read-only view of the canonical chain shared by the block processor,
//! the syncer and the verifier.

use crate::entities::{Hash, PovBlock, U256};
use crate::errors::ChainError;

/// Read access to the local chain.
///
/// Implementations are called from several tasks concurrently and must not
/// block for long; the reference adapter is in-memory.
pub trait ChainReader: Send + Sync {
    /// Whether the block is already stored (on any branch).
    fn has_block(&self, hash: &Hash, height: u64) -> bool;

    /// Look up a stored block on any branch.
    fn block_by_hash(&self, hash: &Hash) -> Option<PovBlock>;

    /// Canonical block at `height`.
    fn block_by_height(&self, height: u64) -> Result<PovBlock, ChainError>;

    fn genesis_block(&self) -> PovBlock;

    /// Tip of the canonical chain.
    fn latest_block(&self) -> Result<PovBlock, ChainError>;

    /// Cumulative difficulty from genesis through `hash`.
    fn total_difficulty(&self, hash: &Hash) -> Option<U256>;

    /// First locator hash that is on the canonical chain.
    fn locate_best_block(&self, locators: &[Hash]) -> Option<PovBlock>;

    /// Sparse list of canonical ancestors, walking back from `from` (or the
    /// tip) with exponentially growing steps and ending at genesis.
    fn block_locator(&self, from: Option<Hash>) -> Vec<Hash>;
}
