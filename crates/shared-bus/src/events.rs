//! # Blockchain Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{BlockOrigin, Hash, PeerId, PovBlock, SyncState};
use shared_types::ipc::PeerMessage;

/// Subsystem identifiers used as event sources.
pub mod subsystem {
    /// Peer transport (outside the core).
    pub const TRANSPORT: u8 = 0;
    pub const STATE_TRIE: u8 = 1;
    pub const BLOCK_PROCESSOR: u8 = 2;
    pub const PEER_SYNC: u8 = 3;
    /// Ledger store (outside the core).
    pub const LEDGER: u8 = 9;
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockchainEvent {
    // =========================================================================
    // TRANSPORT → CORE
    // =========================================================================
    /// A peer stream was opened.
    PeerConnected { peer_id: PeerId },

    /// A peer stream was closed.
    PeerDisconnected { peer_id: PeerId },

    /// A decoded message arrived from a peer.
    PeerMessageReceived {
        peer_id: PeerId,
        message: PeerMessage,
    },

    /// A block was gossiped to us (or mined locally and looped back).
    BlockReceived {
        block: PovBlock,
        origin: BlockOrigin,
        /// Sender, absent for local blocks.
        peer_id: Option<PeerId>,
    },

    // =========================================================================
    // LEDGER → CORE
    // =========================================================================
    /// A ledger transaction is now committed and available for block
    /// verification.
    TransactionCommitted { tx_hash: Hash },

    // =========================================================================
    // PEER SYNC → TRANSPORT
    // =========================================================================
    /// Deliver a message to one peer.
    SendToPeer {
        peer_id: PeerId,
        message: PeerMessage,
    },

    /// Deliver a message to every connected peer.
    Broadcast { message: PeerMessage },

    /// The syncer changed state.
    SyncStateChanged { state: SyncState },
}

impl BlockchainEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::PeerConnected { .. }
            | Self::PeerDisconnected { .. }
            | Self::PeerMessageReceived { .. }
            | Self::BlockReceived { .. } => EventTopic::Network,
            Self::TransactionCommitted { .. } => EventTopic::Ledger,
            Self::SendToPeer { .. } | Self::Broadcast { .. } => EventTopic::Outbound,
            Self::SyncStateChanged { .. } => EventTopic::Sync,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::PeerConnected { .. }
            | Self::PeerDisconnected { .. }
            | Self::PeerMessageReceived { .. }
            | Self::BlockReceived { .. } => subsystem::TRANSPORT,
            Self::TransactionCommitted { .. } => subsystem::LEDGER,
            Self::SendToPeer { .. } | Self::Broadcast { .. } | Self::SyncStateChanged { .. } => {
                subsystem::PEER_SYNC
            }
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Inbound peer traffic.
    Network,
    /// Ledger commits.
    Ledger,
    /// Messages the core wants the transport to send.
    Outbound,
    /// Sync state transitions.
    Sync,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BlockchainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}
