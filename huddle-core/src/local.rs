//! Local-discovery session variant: wraps a LAN peer discovery transport.

use tracing::trace;

use crate::adapter::{DiscoveryBackend, LinkState, Notice, SessionAdapter};
use crate::error::ConnectivityError;
use crate::event::TransportEvent;
use crate::payload::DeliveryMode;
use crate::roster::PeerIdentity;
use crate::state::ConnectionState;

/// Adapter over a local-network discovery/session transport. Owns the
/// backend handle and the roster; advertising and the peer picker drive the
/// Connecting phase, transport events drive everything else.
pub struct LocalDiscoveryAdapter {
    backend: Box<dyn DiscoveryBackend>,
    link: LinkState,
}

impl LocalDiscoveryAdapter {
    pub fn new(backend: Box<dyn DiscoveryBackend>) -> Self {
        Self {
            backend,
            link: LinkState::new(),
        }
    }
}

impl SessionAdapter for LocalDiscoveryAdapter {
    fn start_advertising(&mut self) -> Vec<Notice> {
        if self.link.advertising() {
            return Vec::new();
        }
        self.backend.start_advertising();
        self.link.begin_advertising()
    }

    fn stop_advertising(&mut self) -> Vec<Notice> {
        if !self.link.advertising() {
            return Vec::new();
        }
        self.backend.stop_advertising();
        self.link.end_advertising()
    }

    fn request_peers(&mut self) -> Result<Vec<Notice>, ConnectivityError> {
        self.backend.open_peer_picker();
        Ok(self.link.begin_search())
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
            TransportEvent::AdvertisingFailed { reason } => self.link.fail(reason),
            TransportEvent::SessionFailed { reason } => self.link.fail(reason),
            other => {
                trace!(?other, "matchmaking event on local session, ignoring");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::PeerId;
    use crate::test_support::{BackendCall, CallLog, RecordingDiscovery};

    fn adapter() -> (LocalDiscoveryAdapter, CallLog) {
        let (backend, calls) = RecordingDiscovery::new();
        (LocalDiscoveryAdapter::new(Box::new(backend)), calls)
    }

    fn joined(id: &str, name: &str) -> TransportEvent {
        TransportEvent::PeerConnected {
            peer: PeerId::new(id),
            display_name: name.into(),
        }
    }

    fn left(id: &str) -> TransportEvent {
        TransportEvent::PeerDisconnected {
            peer: PeerId::new(id),
        }
    }

    #[test]
    fn advertise_join_leave_sequence() {
        let (mut adapter, _calls) = adapter();
        assert_eq!(adapter.state(), ConnectionState::NotConnected);

        let notices = adapter.start_advertising();
        assert_eq!(
            notices,
            vec![Notice::StateChanged(ConnectionState::Connecting)]
        );

        let notices = adapter.apply(joined("p1", "Alice"));
        assert_eq!(
            notices,
            vec![Notice::StateChanged(ConnectionState::Connected)]
        );

        // Additional peer: roster grows, no transition.
        let notices = adapter.apply(joined("p2", "Bob"));
        assert!(notices.is_empty());
        let names: Vec<&str> = adapter
            .peers()
            .iter()
            .map(|p| p.display_name.as_str())
            .collect();
        assert_eq!(names, ["Alice", "Bob"]);

        let notices = adapter.apply(left("p1"));
        assert!(notices.is_empty());
        assert_eq!(adapter.state(), ConnectionState::Connected);
        assert_eq!(adapter.peers()[0].display_name, "Bob");

        let notices = adapter.apply(left("p2"));
        assert_eq!(
            notices,
            vec![Notice::StateChanged(ConnectionState::NotConnected)]
        );
        assert!(adapter.peers().is_empty());
    }

    #[test]
    fn send_fails_without_connection_and_never_reaches_backend() {
        let (mut adapter, calls) = adapter();
        assert_eq!(
            adapter.send(b"hi", DeliveryMode::Reliable),
            Err(ConnectivityError::NotConnected)
        );
        adapter.start_advertising();
        // Connecting still rejects sends.
        assert_eq!(
            adapter.send(b"hi", DeliveryMode::Unreliable),
            Err(ConnectivityError::NotConnected)
        );
        let sends = calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, BackendCall::Send(..)))
            .count();
        assert_eq!(sends, 0);
    }

    #[test]
    fn send_forwards_exact_bytes_and_mode() {
        let (mut adapter, calls) = adapter();
        adapter.apply(joined("p1", "Alice"));
        let payload = [0u8, 1, 2, 255, 42];
        adapter.send(&payload, DeliveryMode::Unreliable).unwrap();
        assert_eq!(
            calls.borrow().last(),
            Some(&BackendCall::Send(
                payload.to_vec(),
                DeliveryMode::Unreliable
            ))
        );
    }

    #[test]
    fn stale_disconnect_is_ignored() {
        let (mut adapter, _calls) = adapter();
        adapter.apply(joined("p1", "Alice"));
        let notices = adapter.apply(left("ghost"));
        assert!(notices.is_empty());
        assert_eq!(adapter.state(), ConnectionState::Connected);
        assert_eq!(adapter.peers().len(), 1);
    }

    #[test]
    fn advertising_failure_drops_to_not_connected() {
        let (mut adapter, _calls) = adapter();
        adapter.start_advertising();
        let notices = adapter.apply(TransportEvent::AdvertisingFailed {
            reason: "radio off".into(),
        });
        assert_eq!(
            notices,
            vec![
                Notice::TransportFailure("radio off".into()),
                Notice::StateChanged(ConnectionState::NotConnected),
            ]
        );
        // Advertising can be retried after the failure.
        let notices = adapter.start_advertising();
        assert_eq!(
            notices,
            vec![Notice::StateChanged(ConnectionState::Connecting)]
        );
    }

    #[test]
    fn stop_advertising_is_idempotent() {
        let (mut adapter, calls) = adapter();
        adapter.stop_advertising();
        assert!(calls.borrow().is_empty());
        adapter.start_advertising();
        let notices = adapter.stop_advertising();
        assert_eq!(
            notices,
            vec![Notice::StateChanged(ConnectionState::NotConnected)]
        );
        let notices = adapter.stop_advertising();
        assert!(notices.is_empty());
    }

    #[test]
    fn stop_advertising_keeps_open_browse_connecting() {
        let (mut adapter, _calls) = adapter();
        adapter.start_advertising();
        adapter.request_peers().unwrap();
        // The picker browse is still in flight; cancelling advertising must
        // not end its Connecting phase.
        let notices = adapter.stop_advertising();
        assert!(notices.is_empty());
        assert_eq!(adapter.state(), ConnectionState::Connecting);
    }

    #[test]
    fn disconnect_twice_is_identical() {
        let (mut adapter, calls) = adapter();
        adapter.start_advertising();
        adapter.apply(joined("p1", "Alice"));
        let notices = adapter.disconnect();
        assert_eq!(
            notices,
            vec![Notice::StateChanged(ConnectionState::NotConnected)]
        );
        assert!(adapter.peers().is_empty());

        let notices = adapter.disconnect();
        assert!(notices.is_empty());
        assert_eq!(adapter.state(), ConnectionState::NotConnected);
        assert!(adapter.peers().is_empty());
        // The backend is told to disconnect each time; it treats the second
        // call as a no-op itself.
        let disconnects = calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, BackendCall::Disconnect))
            .count();
        assert_eq!(disconnects, 2);
    }

    #[test]
    fn matchmaking_events_are_ignored() {
        let (mut adapter, _calls) = adapter();
        assert!(adapter.apply(TransportEvent::LoginCompleted).is_empty());
        assert!(adapter.apply(TransportEvent::MatchFound).is_empty());
        assert!(adapter
            .apply(TransportEvent::MatchFailed {
                reason: "n/a".into()
            })
            .is_empty());
        assert_eq!(adapter.state(), ConnectionState::NotConnected);
    }

    #[test]
    fn local_variant_is_always_logged_in() {
        let (mut adapter, calls) = adapter();
        assert!(adapter.is_logged_in());
        adapter.login();
        assert!(calls.borrow().is_empty());
        assert!(adapter.request_peers().is_ok());
        assert_eq!(calls.borrow().last(), Some(&BackendCall::OpenPeerPicker));
    }
}
