//! Peer identity and the live roster of connected peers.

use serde::{Deserialize, Serialize};

/// Opaque peer identifier, stable for the lifetime of a session. The format
/// is provider-defined; nothing in this layer inspects or compares it beyond
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        PeerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A connected peer: opaque id plus human-readable display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIdentity {
    pub id: PeerId,
    pub display_name: String,
}

/// Insertion-ordered set of connected peers. Mutated only by the owning
/// adapter in response to translated transport events, and the sole source
/// of truth for whether the session counts as Connected.
#[derive(Debug, Default)]
pub struct PeerRoster {
    peers: Vec<PeerIdentity>,
}

impl PeerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Re-adding a present id updates its display name in place
    /// and never duplicates the entry.
    pub fn add(&mut self, id: PeerId, display_name: impl Into<String>) {
        let display_name = display_name.into();
        if let Some(existing) = self.peers.iter_mut().find(|p| p.id == id) {
            existing.display_name = display_name;
            return;
        }
        self.peers.push(PeerIdentity { id, display_name });
    }

    /// Remove a peer by id. Returns false if the id is absent, so stale
    /// disconnect events redelivered by the transport stay harmless.
    pub fn remove(&mut self, id: &PeerId) -> bool {
        let before = self.peers.len();
        self.peers.retain(|p| p.id != *id);
        self.peers.len() != before
    }

    /// Connected peers in the order they joined.
    pub fn list(&self) -> &[PeerIdentity] {
        &self.peers
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
