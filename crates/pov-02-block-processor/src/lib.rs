//! # pov-02-block-processor
//!
//! Block Processor subsystem for PoV-Chain.
//!
//! ## Role in System
//!
//! Every candidate block (locally mined, gossiped, or pulled by the syncer)
//! passes through one admission loop that owns all mutable admission state.
//! Blocks whose parent is unknown wait in the orphan pool; blocks whose
//! ledger transactions are not yet committed wait in the pending pool. Both
//! are re-admitted automatically once the missing piece arrives.
//!
//! ```text
//! submit() ──┐
//! submit_mined() ──→ [admission channel] ──→ BlockProcessor loop
//! notify_transaction_available() ┘                │
//!                       ┌────────────────────────┼────────────────────┐
//!                       ↓                        ↓                    ↓
//!                 OrphanPool               BlockVerifier         PendingPool
//!                 (by parent)                    │               (by tx hash)
//!                       ↑                        ↓                    │
//!                       └── cascade ←── ChainStore::insert_block      │
//!                                                 ↑                   │
//!                                                 └── resubmit ←──────┘
//! ```
//!
//! ## Invariants
//!
//! - A block hash is never both an orphan and part of the chain.
//! - Both pools are bounded; when full the entry closest to expiry is
//!   evicted.
//! - A reply channel is answered exactly once.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::ProcessorConfig;
pub use domain::*;
pub use ports::*;
pub use service::{BlockProcessor, BlockProcessorHandle, ProcessorDependencies};
