//! Matchmaking session variant: wraps a remote pairing transport that
//! requires an authenticated login before matching can start.

use tracing::{trace, warn};

use crate::adapter::{LinkState, MatchmakingBackend, Notice, SessionAdapter};
use crate::error::ConnectivityError;
use crate::event::TransportEvent;
use crate::payload::DeliveryMode;
use crate::roster::PeerIdentity;
use crate::state::ConnectionState;

/// Adapter over a remote matchmaking transport. The login flag is distinct
/// from [`ConnectionState`]: login is a one-time asynchronous step that
/// completes before any session-level transition, and gates whether matching
/// requests are attempted at all.
pub struct MatchmakingAdapter {
    backend: Box<dyn MatchmakingBackend>,
    link: LinkState,
    logged_in: bool,
}

impl MatchmakingAdapter {
    pub fn new(backend: Box<dyn MatchmakingBackend>) -> Self {
        Self {
            backend,
            link: LinkState::new(),
            logged_in: false,
        }
    }
}

impl SessionAdapter for MatchmakingAdapter {
    fn start_advertising(&mut self) -> Vec<Notice> {
        // The matcher pairs peers itself; there is no advertising phase.
        Vec::new()
    }

    fn stop_advertising(&mut self) -> Vec<Notice> {
        Vec::new()
    }

    fn request_peers(&mut self) -> Result<Vec<Notice>, ConnectivityError> {
        if !self.logged_in {
            return Err(ConnectivityError::NotLoggedIn);
        }
        self.backend.request_match();
        Ok(self.link.begin_search())
    }

    fn login(&mut self) {
        if self.logged_in {
            return;
        }
        self.backend.login();
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn send(&mut self, payload: &[u8], mode: DeliveryMode) -> Result<(), ConnectivityError> {
        if self.link.state() != ConnectionState::Connected {
            return Err(ConnectivityError::NotConnected);
        }
        self.backend.send(payload, mode);
        Ok(())
    }

    fn disconnect(&mut self) -> Vec<Notice> {
        self.backend.disconnect();
        self.link.shutdown()
    }

    fn state(&self) -> ConnectionState {
        self.link.state()
    }

    fn peers(&self) -> &[PeerIdentity] {
        self.link.peers()
    }

    fn apply(&mut self, event: TransportEvent) -> Vec<Notice> {
        match event {
            TransportEvent::PeerConnected { peer, display_name } => {
                self.link.peer_connected(peer, display_name)
            }
            TransportEvent::PeerDisconnected { peer } => self.link.peer_disconnected(&peer),
            TransportEvent::DataReceived { payload, .. } => vec![Notice::Data(payload)],
            TransportEvent::LoginCompleted => {
                self.logged_in = true;
                vec![Notice::LoginCompleted]
            }
            TransportEvent::LoginFailed { reason } => {
                // Login precedes any session transition; state is untouched,
                // only the detail is surfaced.
                warn!(%reason, "matchmaking login failed");
                vec![Notice::TransportFailure(reason)]
            }
            TransportEvent::MatchFound => vec![Notice::MatchReady],
            TransportEvent::MatchFailed { reason } => self.link.fail(reason),
            TransportEvent::SessionFailed { reason } => self.link.fail(reason),
            TransportEvent::AdvertisingFailed { reason } => {
                trace!(%reason, "advertising event on matchmaking session, ignoring");
                Vec::new()
            }
        }
    }
}
