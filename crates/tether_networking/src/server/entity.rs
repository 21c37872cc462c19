//! # Room Entities
//!
//! The contract between simulated objects and the room that drives them.
//!
//! Per-entity state machine, as seen by the tick pipeline:
//!
//! ```text
//! Active ──mark_for_removal──▶ PendingRemoval ──next tick, wave 0──▶ Removed
//!                               ▲          │
//!                               └──────────┘ (marking again is a no-op)
//! ```

use std::any::Any;

use tether_core::{EntityId, PoolStamp, Poolable, Tick};

/// Who simulates an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Authority {
    /// Simulated and removed by this room.
    #[default]
    Server,
    /// Registered in the room but simulated elsewhere; the tick pipeline
    /// skips it and it cannot be marked for removal here.
    Remote,
}

/// Identity, removal flag and pool stamp shared by every entity.
#[derive(Debug, Default)]
pub struct EntityCore {
    id: EntityId,
    removing: bool,
    stamp: PoolStamp<Box<dyn RoomEntity>>,
}

impl EntityCore {
    /// Creates an unassigned core. Entities embed one of these.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity's identity, [`EntityId::INVALID`] until the room assigns one.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// True once the entity has been marked for removal.
    #[inline]
    #[must_use]
    pub const fn is_removing(&self) -> bool {
        self.removing
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        debug_assert!(!self.id.is_valid(), "entity {} assigned twice", self.id);
        self.id = id;
    }

    pub(crate) fn mark_for_removal(&mut self) {
        self.removing = true;
    }

    /// Clears identity and removal flag; the stamp survives.
    fn reset(&mut self) {
        self.id = EntityId::INVALID;
        self.removing = false;
    }
}

/// Upcast helper so typed access works through `dyn RoomEntity`.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A simulated object living in a [`ServerRoom`](super::ServerRoom).
///
/// Lifecycle hooks run in separate full passes each tick: every entity's
/// `pre_update` completes before any entity's `update`, and every `update`
/// before any `post_update`.
pub trait RoomEntity: AsAny + Send + 'static {
    /// Shared identity and removal state.
    fn core(&self) -> &EntityCore;

    /// Shared identity and removal state, mutably.
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Who simulates this entity.
    fn authority(&self) -> Authority {
        Authority::Server
    }

    /// Wave 1: start or initialize for this tick.
    fn pre_update(&mut self, _tick: Tick) {}

    /// Wave 2: main simulation step.
    fn update(&mut self, tick: Tick);

    /// Wave 3: react to the finished step.
    fn post_update(&mut self, _tick: Tick) {}

    /// Persist a historical record for resynchronization.
    fn store_record(&mut self, _tick: Tick) {}

    /// Restore game state to its freshly-constructed value before the
    /// entity returns to its pool.
    fn reset_state(&mut self) {}
}

impl dyn RoomEntity {
    /// The entity's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.core().id()
    }

    /// True once the entity has been marked for removal.
    #[inline]
    #[must_use]
    pub fn is_removing(&self) -> bool {
        self.core().is_removing()
    }

    /// Downcasts to a concrete entity type.
    #[must_use]
    pub fn downcast_ref<T: RoomEntity>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcasts to a concrete entity type, mutably.
    #[must_use]
    pub fn downcast_mut<T: RoomEntity>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

impl Poolable for Box<dyn RoomEntity> {
    fn stamp(&self) -> &PoolStamp<Self> {
        &self.core().stamp
    }

    fn stamp_mut(&mut self) -> &mut PoolStamp<Self> {
        &mut self.core_mut().stamp
    }

    fn reset(&mut self) {
        self.core_mut().reset();
        self.reset_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Crate {
        core: EntityCore,
        hits: u32,
    }

    impl RoomEntity for Crate {
        fn core(&self) -> &EntityCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut EntityCore {
            &mut self.core
        }

        fn update(&mut self, _tick: Tick) {
            self.hits += 1;
        }

        fn reset_state(&mut self) {
            self.hits = 0;
        }
    }

    #[test]
    fn test_downcast_through_dyn() {
        let mut boxed: Box<dyn RoomEntity> = Box::new(Crate::default());
        boxed.update(Tick::START);

        assert_eq!(boxed.downcast_ref::<Crate>().map(|c| c.hits), Some(1));
        assert!(boxed.downcast_mut::<Crate>().is_some());
    }

    #[test]
    fn test_reset_keeps_stamp_clears_state() {
        let mut boxed: Box<dyn RoomEntity> = Box::new(Crate::default());
        boxed.core_mut().assign_id(EntityId::START);
        boxed.core_mut().mark_for_removal();
        boxed.update(Tick::START);

        Poolable::reset(&mut boxed);

        assert_eq!(boxed.id(), EntityId::INVALID);
        assert!(!boxed.is_removing());
        assert_eq!(boxed.downcast_ref::<Crate>().map(|c| c.hits), Some(0));
    }

    #[test]
    fn test_default_authority_is_server() {
        let entity = Crate::default();
        assert_eq!(entity.authority(), Authority::Server);
    }
}
