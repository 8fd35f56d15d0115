//! Backend command contract, the uniform adapter capability surface, and the
//! link state shared by both adapter variants.

use tracing::{debug, trace, warn};

use crate::error::ConnectivityError;
use crate::event::TransportEvent;
use crate::payload::DeliveryMode;
use crate::roster::{PeerId, PeerIdentity, PeerRoster};
use crate::state::ConnectionState;

/// Commands the local-discovery adapter issues to its wrapped native
/// transport. All fire-and-forget: outcomes come back later as
/// [`TransportEvent`]s, so no operation blocks on the network.
pub trait DiscoveryBackend {
    /// Begin broadcasting the named service.
    fn start_advertising(&mut self);
    fn stop_advertising(&mut self);
    /// Surface the transport's peer list so the user can invite peers.
    fn open_peer_picker(&mut self);
    /// Hand one payload and its mode tag to the transport, unmodified.
    fn send(&mut self, payload: &[u8], mode: DeliveryMode);
    /// Tear down the underlying session.
    fn disconnect(&mut self);
}

/// Commands the matchmaking adapter issues to its wrapped transport.
pub trait MatchmakingBackend {
    /// Start the one-time asynchronous login.
    fn login(&mut self);
    /// Ask the matcher to find and connect a remote peer.
    fn request_match(&mut self);
    fn send(&mut self, payload: &[u8], mode: DeliveryMode);
    fn disconnect(&mut self);
}

/// Observer-facing effect of one event or operation. The facade dispatches
/// these in order, synchronously, after the adapter has finished mutating
/// its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    StateChanged(ConnectionState),
    Data(Vec<u8>),
    LoginCompleted,
    MatchReady,
    TransportFailure(String),
}

/// Uniform capability surface over both session variants. Application code
/// depends only on this trait; the concrete variant is chosen when the
/// session starts.
pub trait SessionAdapter {
    fn start_advertising(&mut self) -> Vec<Notice>;
    fn stop_advertising(&mut self) -> Vec<Notice>;
    /// Browse-and-invite for the local variant, request-matching for the
    /// matchmaking variant.
    fn request_peers(&mut self) -> Result<Vec<Notice>, ConnectivityError>;
    /// Begin the matchmaking login. No-op for the local variant.
    fn login(&mut self) {}
    /// Whether matching requests may be attempted. Always true for the local
    /// variant, which has no authentication phase.
    fn is_logged_in(&self) -> bool {
        true
    }
    fn send(&mut self, payload: &[u8], mode: DeliveryMode) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self) -> Vec<Notice>;
    fn state(&self) -> ConnectionState;
    fn peers(&self) -> &[PeerIdentity];
    /// Translate one native event into state/roster mutations and notices.
    fn apply(&mut self, event: TransportEvent) -> Vec<Notice>;
}

/// Roster plus the two Connecting contributions. Every state derivation and
/// peer-event translation lives here so the two adapter variants cannot
/// drift. Advertising and browsing are tracked separately: cancelling one
/// must not end the other's Connecting phase.
#[derive(Debug, Default)]
pub(crate) struct LinkState {
    roster: PeerRoster,
    /// Local advertising in progress.
    advertising: bool,
    /// Browse-and-invite or matching in progress.
    browsing: bool,
}

impl LinkState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current state, derived from the roster rather than a parallel counter.
    pub(crate) fn state(&self) -> ConnectionState {
        if !self.roster.is_empty() {
            ConnectionState::Connected
        } else if self.advertising || self.browsing {
            ConnectionState::Connecting
        } else {
            ConnectionState::NotConnected
        }
    }

    pub(crate) fn advertising(&self) -> bool {
        self.advertising
    }

    pub(crate) fn peers(&self) -> &[PeerIdentity] {
        self.roster.list()
    }

    /// Run `mutate` and append a StateChanged notice only when the derived
    /// state actually moved.
    fn transition(&mut self, out: &mut Vec<Notice>, mutate: impl FnOnce(&mut Self)) {
        let before = self.state();
        mutate(self);
        let after = self.state();
        if before != after {
            debug!(?before, ?after, "connection state changed");
            out.push(Notice::StateChanged(after));
        }
    }

    pub(crate) fn begin_advertising(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        self.transition(&mut out, |s| s.advertising = true);
        out
    }

    pub(crate) fn end_advertising(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        self.transition(&mut out, |s| s.advertising = false);
        out
    }

    /// Browse-and-invite or matching started.
    pub(crate) fn begin_search(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        self.transition(&mut out, |s| s.browsing = true);
        out
    }

    pub(crate) fn peer_connected(&mut self, peer: PeerId, display_name: String) -> Vec<Notice> {
        let mut out = Vec::new();
        self.transition(&mut out, |s| s.roster.add(peer, display_name));
        out
    }

    pub(crate) fn peer_disconnected(&mut self, peer: &PeerId) -> Vec<Notice> {
        let mut out = Vec::new();
        self.transition(&mut out, |s| {
            if !s.roster.remove(peer) {
                // Native transports may redeliver stale leave events.
                trace!(%peer, "disconnect for peer not in roster, ignoring");
                return;
            }
            if s.roster.is_empty() {
                // Last peer gone: the session is over, not back to searching.
                s.advertising = false;
                s.browsing = false;
            }
        });
        out
    }

    /// Native failure: report the reason, drop everything, land in
    /// NotConnected. Retry is a caller decision.
    pub(crate) fn fail(&mut self, reason: String) -> Vec<Notice> {
        warn!(%reason, "transport failure");
        let mut out = vec![Notice::TransportFailure(reason)];
        self.transition(&mut out, |s| {
            s.roster.clear();
            s.advertising = false;
            s.browsing = false;
        });
        out
    }

    /// Explicit teardown: clear the roster unconditionally, stop searching.
    pub(crate) fn shutdown(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        self.transition(&mut out, |s| {
            s.roster.clear();
            s.advertising = false;
            s.browsing = false;
        });
        out
    }
}
