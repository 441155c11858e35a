//! Syncer errors.

use shared_types::{ChainError, Hash};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("No total difficulty recorded for block {}", shared_types::short_hash(hash))]
    MissingTotalDifficulty { hash: Hash },

    #[error("Block sink refused block: {0}")]
    Sink(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
