//! Observer contract the application implements, and the send capability
//! handed back into delivery callbacks.

use crate::adapter::SessionAdapter;
use crate::error::ConnectivityError;
use crate::payload::DeliveryMode;
use crate::roster::PeerIdentity;
use crate::state::ConnectionState;

/// The single registered observer; [`crate::Connectivity::configure`]
/// replaces any previous one. Callbacks run synchronously in event order,
/// never buffered beyond the one in flight.
pub trait ConnectivityObserver {
    fn on_state_changed(&mut self, state: ConnectionState);
    /// One inbound payload. `link` allows replying from inside the callback
    /// without re-entering the facade.
    fn on_data_received(&mut self, link: &mut SessionLink<'_>, payload: &[u8]);
    /// Matchmaking path only: login finished.
    fn on_login_completed(&mut self) {}
    /// Matchmaking path only: the matcher assembled a full match.
    fn on_match_ready(&mut self) {}
    /// Diagnostic detail accompanying a failure-driven state change.
    fn on_transport_failure(&mut self, _reason: &str) {}
}

/// Borrowed view of the active session, valid for the duration of one
/// delivery callback.
pub struct SessionLink<'a> {
    pub(crate) adapter: &'a mut dyn SessionAdapter,
}

impl SessionLink<'_> {
    pub fn send(&mut self, payload: &[u8], mode: DeliveryMode) -> Result<(), ConnectivityError> {
        self.adapter.send(payload, mode)
    }

    pub fn state(&self) -> ConnectionState {
        self.adapter.state()
    }

    pub fn peers(&self) -> &[PeerIdentity] {
        self.adapter.peers()
    }
}
