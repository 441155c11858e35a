//! # PoV-Chain Test Suite
//!
//! Integration tests that run complete nodes (real verifier, chain store
//! and trie database) over the in-memory bus.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── block_admission.rs   # orphans, pending transactions, forks
//!     └── peer_sync.rs         # two nodes syncing over linked buses
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pov-tests
//! cargo test -p pov-tests integration::peer_sync
//! ```

pub mod integration;
