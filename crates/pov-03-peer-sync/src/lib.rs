//! # pov-03-peer-sync
//!
//! Peer Syncer subsystem for PoV-Chain.
//!
//! ## Role in System
//!
//! Tracks every connected peer's advertised height and total difficulty,
//! picks the heaviest peer, and pulls blocks from it until the local chain
//! reaches that peer's height. Pulled blocks go to the Block Processor
//! through the [`BlockSink`](ports::BlockSink) port.
//!
//! ## State Machine
//!
//! ```text
//!              wait for peers / timeout
//! NotStarted ───────────────────────────→ Syncing ──height reached──→ Done
//!                                            │
//!                                            └──no peer 10min / stall 30min──→ Err
//! ```
//!
//! ## Tasks
//!
//! - **message loop**: handles inbound peer messages and the periodic status
//!   broadcast.
//! - **sync loop**: waits for enough peers, then drives the state machine on
//!   two tickers (sync-peer check, chain check).

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::SyncConfig;
pub use domain::*;
pub use ports::*;
pub use service::{PeerSyncer, SyncDependencies, SyncHandle};
