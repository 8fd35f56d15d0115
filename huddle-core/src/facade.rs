//! The single object application code holds: owns the active adapter and the
//! registered observer, forwards events, enforces one session at a time.

use tracing::warn;

use crate::adapter::{Notice, SessionAdapter};
use crate::error::ConnectivityError;
use crate::event::TransportEvent;
use crate::observer::{ConnectivityObserver, SessionLink};
use crate::payload::DeliveryMode;
use crate::roster::PeerIdentity;
use crate::state::ConnectionState;

/// Unified connectivity surface over both session variants. The facade never
/// mutates roster or state itself; it dispatches adapter notices to the
/// observer in event order.
#[derive(Default)]
pub struct Connectivity {
    observer: Option<Box<dyn ConnectivityObserver>>,
    session: Option<Box<dyn SessionAdapter>>,
}

impl Connectivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single data+state observer. Last write wins; there is no
    /// multi-observer fan-out.
    pub fn configure(&mut self, observer: Box<dyn ConnectivityObserver>) {
        self.observer = Some(observer);
    }

    /// Activate an adapter. Exactly one may be live; tear the old one down
    /// with [`Connectivity::teardown`] first.
    pub fn start_session(
        &mut self,
        adapter: Box<dyn SessionAdapter>,
    ) -> Result<(), ConnectivityError> {
        if self.session.is_some() {
            return Err(ConnectivityError::SessionAlreadyActive);
        }
        self.session = Some(adapter);
        Ok(())
    }

    /// Deliver one native transport event. Events arriving with no active
    /// session are dropped: stale redelivery is expected, not an error.
    pub fn deliver(&mut self, event: TransportEvent) {
        let Some(session) = self.session.as_mut() else {
            warn!(?event, "transport event with no active session, dropping");
            return;
        };
        let notices = session.apply(event);
        Self::dispatch(session.as_mut(), &mut self.observer, notices);
    }

    /// Allow this device to be discovered and invited by other devices.
    pub fn start_advertising(&mut self) {
        let Some(session) = self.session.as_mut() else {
            warn!("start_advertising with no active session");
            return;
        };
        let notices = session.start_advertising();
        Self::dispatch(session.as_mut(), &mut self.observer, notices);
    }

    pub fn stop_advertising(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let notices = session.stop_advertising();
        Self::dispatch(session.as_mut(), &mut self.observer, notices);
    }

    /// Browse-and-invite (local variant) or request matching (matchmaking
    /// variant). Fails fast with `NotLoggedIn` on the matchmaking path
    /// before login has completed.
    pub fn request_peers(&mut self) -> Result<(), ConnectivityError> {
        let Some(session) = self.session.as_mut() else {
            warn!("request_peers with no active session");
            return Ok(());
        };
        let notices = session.request_peers()?;
        Self::dispatch(session.as_mut(), &mut self.observer, notices);
        Ok(())
    }

    /// Begin the matchmaking login. No-op on the local-discovery path.
    pub fn login(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.login();
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.as_ref().map(|s| s.is_logged_in()).unwrap_or(false)
    }

    /// Forward one payload and its mode tag to the active transport. The
    /// bytes are handed over unmodified; no framing, chunking, or retry is
    /// added here.
    pub fn send(&mut self, payload: &[u8], mode: DeliveryMode) -> Result<(), ConnectivityError> {
        let Some(session) = self.session.as_mut() else {
            return Err(ConnectivityError::NotConnected);
        };
        session.send(payload, mode)
    }

    /// Disconnect from the current session. Idempotent; the adapter stays
    /// active and may start advertising or matching again.
    pub fn disconnect(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let notices = session.disconnect();
        Self::dispatch(session.as_mut(), &mut self.observer, notices);
    }

    /// Disconnect and release the adapter. A new session (of either variant)
    /// may start afterwards.
    pub fn teardown(&mut self) {
        self.disconnect();
        self.session = None;
    }

    pub fn current_state(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(ConnectionState::NotConnected)
    }

    /// Connected peers in join order.
    pub fn connected_peers(&self) -> &[PeerIdentity] {
        self.session.as_ref().map(|s| s.peers()).unwrap_or(&[])
    }

    fn dispatch(
        session: &mut dyn SessionAdapter,
        observer: &mut Option<Box<dyn ConnectivityObserver>>,
        notices: Vec<Notice>,
    ) {
        let Some(observer) = observer.as_mut() else {
            return;
        };
        for notice in notices {
            match notice {
                Notice::StateChanged(state) => observer.on_state_changed(state),
                Notice::Data(payload) => {
                    let mut link = SessionLink {
                        adapter: &mut *session,
                    };
                    observer.on_data_received(&mut link, &payload);
                }
                Notice::LoginCompleted => observer.on_login_completed(),
                Notice::MatchReady => observer.on_match_ready(),
                Notice::TransportFailure(reason) => observer.on_transport_failure(&reason),
            }
        }
    }
}
