//! Native transport events, normalized to one enum.

use crate::roster::PeerId;

/// Asynchronous callback surface each adapter consumes from its wrapped
/// transport. The host translates native callbacks into these and feeds them
/// to [`Connectivity::deliver`](crate::Connectivity::deliver) in delivery
/// order; the layer never reorders, coalesces, or batches them.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A peer joined the session (both sides accepted).
    PeerConnected { peer: PeerId, display_name: String },
    /// A peer left, or its connection was lost.
    PeerDisconnected { peer: PeerId },
    /// One inbound payload, delivered exactly once per native event.
    DataReceived { peer: PeerId, payload: Vec<u8> },
    /// Advertising could not start or stopped unexpectedly.
    AdvertisingFailed { reason: String },
    /// The session itself failed.
    SessionFailed { reason: String },
    /// Matchmaking only: login finished.
    LoginCompleted,
    /// Matchmaking only: login failed.
    LoginFailed { reason: String },
    /// Matchmaking only: the matcher assembled a match.
    MatchFound,
    /// Matchmaking only: matching failed or timed out.
    MatchFailed { reason: String },
}
