//! # Node Runtime Library
//!
//! Wires the state trie, the block processor and the peer syncer into one
//! node over the shared bus. The `pov-node` binary in `main.rs` is a thin
//! wrapper around [`container::PovNode`].
//!
//! ## Modules
//!
//! - `adapters/` - in-memory chain, ledger, verifier and bus-facing ports
//! - `container/` - configuration and the node container
//! - `genesis/` - genesis block construction
//! - `wiring/` - bus event routing into the subsystems
//! - `testing` - chain builders and an in-memory peer link for tests

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod logging;
pub mod testing;
pub mod wiring;

pub use container::{NodeConfig, PovNode};
