//! # Shared Types Crate
//!
//! This crate contains the chain entities, peer message payloads and the
//! read-only chain port used by every PoV subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Plain Data**: Entities are serde-serializable values with no behavior
//!   beyond hashing and size accounting.

pub mod chain;
pub mod entities;
pub mod errors;
pub mod ipc;

pub use chain::ChainReader;
pub use entities::*;
pub use errors::*;
pub use ipc::*;
