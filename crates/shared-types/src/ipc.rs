//! # Peer Message Payloads
//!
//! Payloads exchanged with remote peers by the syncer. The wire framing is
//! owned by the transport; these are the decoded shapes.

use crate::entities::*;
use serde::{Deserialize, Serialize};

/// Chain status advertised to peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PovStatus {
    pub current_height: u64,
    /// Cumulative difficulty of the best block.
    pub current_td: U256,
    pub current_hash: Hash,
    pub genesis_hash: Hash,
}

/// Why a bulk pull was issued. Only `Sync` responses drive the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PullReason {
    Sync,
    Fetch,
}

/// Where the responder starts reading blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullStart {
    /// Sparse ancestor list; the responder resumes after the best common block.
    Locators(Vec<Hash>),
    /// Start at (and include) this block.
    Hash(Hash),
    /// Start at this height.
    Height(u64),
}

/// Request for a contiguous run of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPullRequest {
    pub start: PullStart,
    pub count: u32,
    pub reason: PullReason,
}

/// Blocks returned for a `BulkPullRequest`, in ascending height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPullResponse {
    pub reason: PullReason,
    pub count: u32,
    pub blocks: Vec<PovBlock>,
}

/// Every message the syncer sends to or receives from a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerMessage {
    Status(PovStatus),
    BulkPullRequest(BulkPullRequest),
    BulkPullResponse(BulkPullResponse),
}

impl PeerMessage {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "PovStatus",
            Self::BulkPullRequest(_) => "BulkPullRequest",
            Self::BulkPullResponse(_) => "BulkPullResponse",
        }
    }
}
