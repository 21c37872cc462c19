//! # Sequences
//!
//! Monotonic identities owned by a room:
//! - [`Tick`]: one authoritative simulation step
//! - [`EntityId`]: one entity for the lifetime of its room
//!
//! Both reserve `0` as an invalid sentinel so that pooled objects can be
//! reset to a recognisable "unassigned" state.

use std::fmt;

/// A simulation step number.
///
/// A room starts at [`Tick::INVALID`] and its first step produces
/// [`Tick::START`]. Wraparound policy belongs to whoever serializes ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tick(u32);

impl Tick {
    /// The tick of a room that has not stepped yet.
    pub const INVALID: Self = Self(0);

    /// The first tick produced by a room.
    pub const START: Self = Self(1);

    /// Wraps a raw tick number.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the successor of this tick, wrapping past `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the raw tick number.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true unless this is [`Tick::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Identity of an entity within a room.
///
/// Assigned once at creation by the room's allocator, starting at
/// [`EntityId::START`], and never reused while the room lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Identity of an entity that has not been assigned one (fresh or pooled).
    pub const INVALID: Self = Self(0);

    /// The first identity handed out by a room.
    pub const START: Self = Self(1);

    /// Wraps a raw identity.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the identity allocated after this one, or `None` once the
    /// id space is spent.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Returns the raw identity.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true unless this is [`EntityId::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}
