//! Connection lifecycle state shared by both transport adapters.

/// Exactly one state is active per session at any time. `Connected` is
/// always derived from the roster (at least one confirmed peer), never from
/// a separate counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No active session, or all peers disconnected.
    NotConnected,
    /// Advertising, browsing, or matching in progress; no peer confirmed yet.
    Connecting,
    /// At least one peer confirmed in the roster.
    Connected,
}
