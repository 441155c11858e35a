//! # Subsystem Wiring
//!
//! The transport and the ledger talk to the core only through the shared
//! bus. The router subscribes to their topics and hands each event to the
//! block processor or the peer syncer; the syncer's replies leave through
//! `BusMessenger` on the `Outbound` topic.

pub mod event_routing;

pub use event_routing::{inbound_filter, route, EventRouter, Route};
