//! Huddle session layer reference implementation.
//! Host-driven: no I/O; the host delivers transport events and performs the
//! commands the layer issues to its wrapped backend.

pub mod adapter;
pub mod error;
pub mod event;
pub mod facade;
pub mod local;
pub mod matchmaking;
pub mod observer;
pub mod payload;
pub mod roster;
pub mod state;

pub use adapter::{DiscoveryBackend, MatchmakingBackend, Notice, SessionAdapter};
pub use error::ConnectivityError;
pub use event::TransportEvent;
pub use facade::Connectivity;
pub use local::LocalDiscoveryAdapter;
pub use matchmaking::MatchmakingAdapter;
pub use observer::{ConnectivityObserver, SessionLink};
pub use payload::DeliveryMode;
pub use roster::{PeerId, PeerIdentity, PeerRoster};
pub use state::ConnectionState;

#[cfg(test)]
mod test_support;
