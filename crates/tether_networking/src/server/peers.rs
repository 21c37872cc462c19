//! # Peer Set
//!
//! Connected remote participants. Membership is the only state kept here;
//! delivery, retries and acknowledgement belong to each peer's transport.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::event::RoomEvent;

/// Identity of a connected peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u32);

impl PeerId {
    /// Wraps a transport-assigned identity.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw identity.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A connected remote participant.
pub trait Peer: Send + Sync {
    /// This peer's identity.
    fn id(&self) -> PeerId;

    /// Queues `event` for reliable delivery, trying up to `attempts` times.
    ///
    /// The event is borrowed; implementations copy what they need.
    fn send_event(&self, event: &RoomEvent, attempts: u16);
}

/// The room's connected peers, iterated in id order.
#[derive(Default)]
pub struct PeerSet {
    peers: BTreeMap<PeerId, Arc<dyn Peer>>,
}

impl PeerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `peer`, returning any peer that already held its id.
    pub fn insert(&mut self, peer: Arc<dyn Peer>) -> Option<Arc<dyn Peer>> {
        self.peers.insert(peer.id(), peer)
    }

    /// Removes and returns the peer with this id.
    pub fn remove(&mut self, id: PeerId) -> Option<Arc<dyn Peer>> {
        self.peers.remove(&id)
    }

    /// Looks up a peer.
    #[must_use]
    pub fn get(&self, id: PeerId) -> Option<&Arc<dyn Peer>> {
        self.peers.get(&id)
    }

    /// Returns true if a peer with this id is connected.
    #[must_use]
    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Number of connected peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True when nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterates connected peers.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Peer>> + '_ {
        self.peers.values()
    }

    /// Sends `event` to every peer once. Returns the number of sends.
    pub fn broadcast(&self, event: &RoomEvent, attempts: u16) -> usize {
        for peer in self.peers.values() {
            peer.send_event(event, attempts);
        }
        self.peers.len()
    }
}

impl fmt::Debug for PeerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.peers.keys()).finish()
    }
}
