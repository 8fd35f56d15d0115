//! Recording doubles shared by adapter and facade tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::adapter::{DiscoveryBackend, MatchmakingBackend};
use crate::observer::{ConnectivityObserver, SessionLink};
use crate::payload::DeliveryMode;
use crate::state::ConnectionState;

/// One backend command as observed by a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    StartAdvertising,
    StopAdvertising,
    OpenPeerPicker,
    Login,
    RequestMatch,
    Send(Vec<u8>, DeliveryMode),
    Disconnect,
}

pub type CallLog = Rc<RefCell<Vec<BackendCall>>>;

/// Discovery backend that records every command it is handed.
pub struct RecordingDiscovery {
    calls: CallLog,
}

impl RecordingDiscovery {
    pub fn new() -> (Self, CallLog) {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        (Self { calls: calls.clone() }, calls)
    }
}

impl DiscoveryBackend for RecordingDiscovery {
    fn start_advertising(&mut self) {
        self.calls.borrow_mut().push(BackendCall::StartAdvertising);
    }

    fn stop_advertising(&mut self) {
        self.calls.borrow_mut().push(BackendCall::StopAdvertising);
    }

    fn open_peer_picker(&mut self) {
        self.calls.borrow_mut().push(BackendCall::OpenPeerPicker);
    }

    fn send(&mut self, payload: &[u8], mode: DeliveryMode) {
        self.calls
            .borrow_mut()
            .push(BackendCall::Send(payload.to_vec(), mode));
    }

    fn disconnect(&mut self) {
        self.calls.borrow_mut().push(BackendCall::Disconnect);
    }
}

/// Matchmaking backend that records every command it is handed.
pub struct RecordingMatchmaker {
    calls: CallLog,
}

impl RecordingMatchmaker {
    pub fn new() -> (Self, CallLog) {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        (Self { calls: calls.clone() }, calls)
    }
}

impl MatchmakingBackend for RecordingMatchmaker {
    fn login(&mut self) {
        self.calls.borrow_mut().push(BackendCall::Login);
    }

    fn request_match(&mut self) {
        self.calls.borrow_mut().push(BackendCall::RequestMatch);
    }

    fn send(&mut self, payload: &[u8], mode: DeliveryMode) {
        self.calls
            .borrow_mut()
            .push(BackendCall::Send(payload.to_vec(), mode));
    }

    fn disconnect(&mut self) {
        self.calls.borrow_mut().push(BackendCall::Disconnect);
    }
}

/// One observer callback as observed by a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    State(ConnectionState),
    Data(Vec<u8>),
    LoginCompleted,
    MatchReady,
    Failure(String),
}

pub type CallbackLog = Rc<RefCell<Vec<Callback>>>;

/// Observer that records callbacks; in echo mode it replies to every payload
/// from inside the delivery callback, exercising re-entrant sends.
pub struct CollectingObserver {
    callbacks: CallbackLog,
    echo: bool,
}

impl CollectingObserver {
    pub fn new() -> (Self, CallbackLog) {
        let callbacks: CallbackLog = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                callbacks: callbacks.clone(),
                echo: false,
            },
            callbacks,
        )
    }

    pub fn echoing() -> (Self, CallbackLog) {
        let (mut observer, callbacks) = Self::new();
        observer.echo = true;
        (observer, callbacks)
    }
}

impl ConnectivityObserver for CollectingObserver {
    fn on_state_changed(&mut self, state: ConnectionState) {
        self.callbacks.borrow_mut().push(Callback::State(state));
    }

    fn on_data_received(&mut self, link: &mut SessionLink<'_>, payload: &[u8]) {
        self.callbacks
            .borrow_mut()
            .push(Callback::Data(payload.to_vec()));
        if self.echo {
            link.send(payload, DeliveryMode::Reliable).unwrap();
        }
    }

    fn on_login_completed(&mut self) {
        self.callbacks.borrow_mut().push(Callback::LoginCompleted);
    }

    fn on_match_ready(&mut self) {
        self.callbacks.borrow_mut().push(Callback::MatchReady);
    }

    fn on_transport_failure(&mut self, reason: &str) {
        self.callbacks
            .borrow_mut()
            .push(Callback::Failure(reason.to_string()));
    }
}
