//! # Adapters Module
//!
//! In-memory implementations of the ports the subsystems depend on.
//!
//! | Adapter | Port | Used by |
//! |---------|------|---------|
//! | `InMemoryChain` | `ChainStore` / `ChainReader` | processor, syncer, verifier |
//! | `InMemoryLedger` | `LedgerReader` | verifier |
//! | `ChainVerifier` | `BlockVerifier` | processor |
//! | `BusMessenger` | `PeerMessenger` | syncer |
//! | `ProcessorBlockSink` | `BlockSink` | syncer |

pub mod chain_store;
pub mod ledger;
pub mod messenger;
pub mod verifier;

pub use chain_store::InMemoryChain;
pub use ledger::{InMemoryLedger, LedgerReader};
pub use messenger::{BusMessenger, ProcessorBlockSink};
pub use verifier::ChainVerifier;
