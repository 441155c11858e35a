//! Outbound ports (dependencies the processor requires)

use crate::domain::VerifyOutcome;
use pov_01_state_trie::StateTrie;
use shared_types::{ChainError, ChainReader, PovBlock};

/// Chain store with write access.
pub trait ChainStore: ChainReader {
    /// Append a verified block together with its post-state.
    fn insert_block(&self, block: &PovBlock, state_trie: StateTrie) -> Result<(), ChainError>;
}

/// Full block verification (header, proof of work, transactions, state).
pub trait BlockVerifier: Send + Sync {
    /// `None` means the verifier could not produce an outcome at all.
    fn verify_full(&self, block: &PovBlock) -> Option<VerifyOutcome>;
}
