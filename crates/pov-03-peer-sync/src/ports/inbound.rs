//! Inbound ports: messages the syncer consumes.

use shared_types::{BulkPullRequest, BulkPullResponse, PeerId, PovStatus};

/// Everything the message loop reacts to. Matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// A peer stream was opened.
    StreamAdded { peer_id: PeerId },
    /// A peer stream was closed.
    StreamRemoved { peer_id: PeerId },
    /// A peer advertised its chain status.
    Status { peer_id: PeerId, status: PovStatus },
    /// A peer asks us for blocks.
    BulkPullRequest {
        peer_id: PeerId,
        request: BulkPullRequest,
    },
    /// A peer answered one of our requests.
    BulkPullResponse {
        peer_id: PeerId,
        response: BulkPullResponse,
    },
}

impl SyncMessage {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            Self::StreamAdded { peer_id }
            | Self::StreamRemoved { peer_id }
            | Self::Status { peer_id, .. }
            | Self::BulkPullRequest { peer_id, .. }
            | Self::BulkPullResponse { peer_id, .. } => peer_id,
        }
    }
}
