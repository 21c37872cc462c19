//! # Entity Pools
//!
//! One base/derived pool per registered entity type. Every pool hands out
//! `Box<dyn RoomEntity>`, but each is bound to a single concrete type, so
//! a recycled entity always comes back as the type that was asked for.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use tether_core::Pool;

use super::entity::RoomEntity;

/// Pool of boxed entities.
pub type EntityPool = Pool<Box<dyn RoomEntity>>;

fn boxed_default<T: RoomEntity + Default>() -> Box<dyn RoomEntity> {
    Box::<T>::default()
}

/// Per-type entity pools.
#[derive(Default)]
pub struct EntityPools {
    pools: HashMap<TypeId, EntityPool>,
}

impl EntityPools {
    /// Creates an empty set with no registered types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, built with `T::default()`.
    ///
    /// Registering a type twice keeps the existing pool.
    pub fn register<T: RoomEntity + Default>(&mut self) {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Pool::derived(boxed_default::<T>));
    }

    /// Registers `T` with a custom factory.
    ///
    /// Registering a type twice keeps the existing pool and ignores the new
    /// factory, so entities already handed out still recycle into it.
    pub fn register_with<T, F>(&mut self, factory: F)
    where
        T: RoomEntity,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.pools.entry(TypeId::of::<T>()).or_insert_with(|| {
            Pool::with_factory(move || -> Box<dyn RoomEntity> { Box::new(factory()) })
        });
    }

    /// Returns true once `T` has a pool.
    #[must_use]
    pub fn is_registered<T: RoomEntity>(&self) -> bool {
        self.pools.contains_key(&TypeId::of::<T>())
    }

    /// Allocates a reset `T` from its pool, or `None` if `T` was never registered.
    #[must_use]
    pub fn allocate<T: RoomEntity>(&self) -> Option<Box<dyn RoomEntity>> {
        let pool = self.pools.get(&TypeId::of::<T>())?;
        let entity = pool.allocate();
        debug_assert!(
            (*entity).as_any().is::<T>(),
            "pool for {} produced another type",
            type_name::<T>()
        );
        Some(entity)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// True when no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Fresh, empty pools with the same construction strategies.
    #[must_use]
    pub fn clone_factory(&self) -> Self {
        Self {
            pools: self
                .pools
                .iter()
                .map(|(type_id, pool)| (*type_id, pool.clone_factory()))
                .collect(),
        }
    }
}
