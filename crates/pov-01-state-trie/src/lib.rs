//! # pov-01-state-trie
//!
//! State Trie subsystem for PoV-Chain.
//!
//! ## Role in System
//!
//! - **Trie Store**: versioned account-state tries addressed by root hash,
//!   cloned copy-on-write so a candidate block never disturbs its parent's
//!   state.
//! - **State Applier**: folds a block's ordered ledger transactions over the
//!   parent state and returns the candidate trie for the verifier to compare
//!   against the header's state root.
//!
//! ```text
//! parent.state_hash ──load──→ StateTrie (clone)
//!                                  │
//!                  tx₁, tx₂, … ────┤ apply_transaction (in order)
//!                                  ↓
//!                        candidate StateTrie ──root_hash()──→ compare
//! ```
//!
//! ## Representative Bookkeeping
//!
//! Chain-token transactions also move delegated weight: the previous
//! representative loses the account's prior totals, the current one gains
//! the new totals. All arithmetic is checked.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::{apply_transaction, StateApplier};
