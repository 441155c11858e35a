//! # Genesis Module
//!
//! Genesis block creation and chain initialization.
//!
//! The genesis block is the root of every chain the node accepts:
//!
//! - Height: 0
//! - Parent hash: 32 zero bytes
//! - No transactions
//! - State hash: empty trie root

pub mod builder;

pub use builder::{GenesisBuilder, GenesisConfig, GenesisError};
