//! # Entity Registry
//!
//! Storage for every live entity in a room. The room only talks to it
//! through [`EntityRegistry`], so hosts can substitute their own store.
//!
//! The tick pipeline visits entities in the registry's iteration order, so
//! that order must be stable within a tick. [`OrderedRegistry`] iterates by
//! ascending [`EntityId`], which is creation order.

use std::collections::BTreeMap;

use tether_core::EntityId;

use super::entity::RoomEntity;

/// Owning store of live entities.
pub trait EntityRegistry {
    /// Takes ownership of `entity`, keyed by its id.
    fn register(&mut self, entity: Box<dyn RoomEntity>);

    /// Removes and returns the entity with this id.
    fn unregister(&mut self, id: EntityId) -> Option<Box<dyn RoomEntity>>;

    /// Looks up a live entity.
    fn get(&self, id: EntityId) -> Option<&(dyn RoomEntity + 'static)>;

    /// Looks up a live entity mutably.
    fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn RoomEntity + 'static)>;

    /// Iterates live entities in a stable order.
    fn entities(&self) -> impl Iterator<Item = &(dyn RoomEntity + 'static)> + '_;

    /// Iterates live entities mutably, in the same order as [`EntityRegistry::entities`].
    fn entities_mut(&mut self) -> impl Iterator<Item = &mut (dyn RoomEntity + 'static)> + '_;

    /// Number of live entities.
    fn len(&self) -> usize;

    /// True when no entity is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry iterating in ascending id order.
#[derive(Default)]
pub struct OrderedRegistry {
    entities: BTreeMap<EntityId, Box<dyn RoomEntity>>,
}

impl OrderedRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityRegistry for OrderedRegistry {
    fn register(&mut self, entity: Box<dyn RoomEntity>) {
        let id = entity.id();
        let previous = self.entities.insert(id, entity);
        assert!(previous.is_none(), "entity {id} registered twice");
    }

    fn unregister(&mut self, id: EntityId) -> Option<Box<dyn RoomEntity>> {
        self.entities.remove(&id)
    }

    fn get(&self, id: EntityId) -> Option<&(dyn RoomEntity + 'static)> {
        self.entities.get(&id).map(|entity| &**entity)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn RoomEntity + 'static)> {
        self.entities.get_mut(&id).map(|entity| &mut **entity)
    }

    fn entities(&self) -> impl Iterator<Item = &(dyn RoomEntity + 'static)> + '_ {
        self.entities.values().map(|entity| &**entity)
    }

    fn entities_mut(&mut self) -> impl Iterator<Item = &mut (dyn RoomEntity + 'static)> + '_ {
        self.entities.values_mut().map(|entity| &mut **entity)
    }

    fn len(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::entity::EntityCore;
    use tether_core::Tick;

    #[derive(Default)]
    struct Marker {
        core: EntityCore,
    }

    impl RoomEntity for Marker {
        fn core(&self) -> &EntityCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut EntityCore {
            &mut self.core
        }

        fn update(&mut self, _tick: Tick) {}
    }

    fn marker(raw: u32) -> Box<dyn RoomEntity> {
        let mut entity: Box<dyn RoomEntity> = Box::new(Marker::default());
        entity.core_mut().assign_id(EntityId::new(raw));
        entity
    }

    #[test]
    fn test_iterates_in_id_order() {
        let mut registry = OrderedRegistry::new();
        registry.register(marker(3));
        registry.register(marker(1));
        registry.register(marker(2));

        let order: Vec<u32> = registry.entities().map(|e| e.id().raw()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_unregister_returns_entity() {
        let mut registry = OrderedRegistry::new();
        registry.register(marker(7));
        assert_eq!(registry.len(), 1);

        let entity = registry.unregister(EntityId::new(7)).unwrap();
        assert_eq!(entity.id(), EntityId::new(7));
        assert!(registry.is_empty());
        assert!(registry.unregister(EntityId::new(7)).is_none());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_registration_panics() {
        let mut registry = OrderedRegistry::new();
        registry.register(marker(1));
        registry.register(marker(1));
    }
}
