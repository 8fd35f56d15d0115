//! Delivery mode tag carried with every outbound payload.

use serde::{Deserialize, Serialize};

/// Send semantics requested from the underlying transport. The tag is
/// preserved end to end; the actual guarantee is whatever the transport
/// contract promises for that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Ordered, delivered once or the session reports failure.
    Reliable,
    /// Best effort; no ordering or delivery guarantee.
    Unreliable,
}
