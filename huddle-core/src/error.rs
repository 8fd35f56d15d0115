//! Error kinds reported by the session layer.

/// Precondition violations are returned synchronously and change no state;
/// transport failures arrive asynchronously through the observer. Nothing
/// here is fatal: the caller recovers by retrying the relevant start
/// operation after observing `NotConnected`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectivityError {
    /// Send attempted with no connected peer.
    #[error("no connected peers")]
    NotConnected,
    /// Matching requested before login completed.
    #[error("matchmaking login has not completed")]
    NotLoggedIn,
    /// Start requested while another session is active.
    #[error("a session is already active")]
    SessionAlreadyActive,
    /// Native advertising/matching/session failure, with the transport's
    /// diagnostic reason.
    #[error("transport failure: {0}")]
    Transport(String),
}
