//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Connects the consensus core to its collaborators: the peer transport
//! publishes inbound traffic, the ledger publishes committed transactions,
//! and the syncer publishes outbound messages and state transitions.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Transport   │                    │ Peer Syncer  │
//! │   / Ledger   │    publish()       │  Processor   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! The bus is an ordinary value: the runtime constructs one and hands an
//! `Arc` to every component that needs it. There is no global instance.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{subsystem, BlockchainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
