//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by the chain store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// No canonical block at this height.
    #[error("Block not found at height {height}")]
    BlockNotFound { height: u64 },

    /// Parent block not present when inserting.
    #[error("Parent block not found: cannot insert block at height {height}")]
    UnknownParent { height: u64 },

    /// The store holds no blocks at all.
    #[error("Chain is empty")]
    EmptyChain,

    /// Persisting the state trie of a block failed.
    #[error("State error: {0}")]
    StateError(String),
}
