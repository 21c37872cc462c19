//! # Room Events
//!
//! Reliable messages fanned out to every connected peer. Events churn
//! every tick, so they live in a pool and return there after broadcast.

use tether_core::{PoolStamp, Poolable};

/// Send attempts a fresh event carries.
pub const DEFAULT_EVENT_ATTEMPTS: u16 = 3;

/// A pooled event message.
#[derive(Debug)]
pub struct RoomEvent {
    /// Application-defined event kind.
    pub kind: u16,
    /// Opaque body.
    pub payload: Vec<u8>,
    /// How many times the transport should try to deliver this event.
    pub attempts: u16,
    /// Release to the pool once broadcast.
    pub free_when_sent: bool,
    stamp: PoolStamp<RoomEvent>,
}

impl RoomEvent {
    /// Creates an unpooled event of `kind`.
    #[must_use]
    pub fn new(kind: u16) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Sets the kind and payload in one call.
    pub fn set(&mut self, kind: u16, payload: &[u8]) {
        self.kind = kind;
        self.payload.clear();
        self.payload.extend_from_slice(payload);
    }
}

impl Default for RoomEvent {
    fn default() -> Self {
        Self {
            kind: 0,
            payload: Vec::new(),
            attempts: DEFAULT_EVENT_ATTEMPTS,
            free_when_sent: true,
            stamp: PoolStamp::unstamped(),
        }
    }
}

impl Poolable for RoomEvent {
    fn stamp(&self) -> &PoolStamp<Self> {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut PoolStamp<Self> {
        &mut self.stamp
    }

    fn reset(&mut self) {
        self.kind = 0;
        self.payload.clear();
        self.attempts = DEFAULT_EVENT_ATTEMPTS;
        self.free_when_sent = true;
    }
}
