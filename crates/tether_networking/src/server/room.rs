//! # Server Room
//!
//! The authoritative simulation container. One call to
//! [`ServerRoom::server_tick`] advances the room by one step:
//!
//! ```text
//! tick += 1
//! on_pre_tick
//! partition server entities ──▶ to_remove (flagged) | to_update (live)
//! wave 0  unregister + free      every to_remove entity
//! wave 1  pre_update             every to_update entity
//! wave 2  update                 every to_update entity
//! wave 3  post_update            every to_update entity
//! clear scratch
//! on_post_tick
//! ```
//!
//! Each wave is a full pass over its list before the next begins. Removal
//! only happens in wave 0, so an entity marked during tick `T` is gone
//! before anything else runs in `T + 1`.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use tether_core::{free, EntityId, Pool, Poolable, Tick};
use tracing::{debug, info, trace};

use crate::config::RoomConfig;
use crate::error::{RoomError, RoomResult};

use super::entity::{Authority, RoomEntity};
use super::event::RoomEvent;
use super::factory::EntityPools;
use super::host::ServerHost;
use super::observer::RoomObserver;
use super::peers::{Peer, PeerId, PeerSet};
use super::registry::{EntityRegistry, OrderedRegistry};

/// An authoritative room driving entities through the tick pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let mut room = ServerRoom::new(RoomConfig::default(), TracingHost);
/// room.register_entity::<Projectile>();
///
/// let id = room.create_entity::<Projectile>()?;
/// room.server_tick();             // Projectile updated in tick 1
/// room.mark_for_removal(id)?;
/// room.server_tick();             // Projectile pooled in tick 2, no updates
/// ```
pub struct ServerRoom<R: EntityRegistry = OrderedRegistry> {
    config: RoomConfig,
    tick: Tick,
    next_entity_id: EntityId,
    registry: R,
    entity_pools: EntityPools,
    event_pool: Pool<RoomEvent>,
    peers: PeerSet,
    observers: Vec<Box<dyn RoomObserver>>,
    host: Box<dyn ServerHost>,
    to_update: Vec<EntityId>,
    to_remove: Vec<EntityId>,
}

impl ServerRoom<OrderedRegistry> {
    /// Creates an empty room backed by an [`OrderedRegistry`].
    #[must_use]
    pub fn new(config: RoomConfig, host: impl ServerHost + 'static) -> Self {
        Self::with_registry(config, host, OrderedRegistry::new())
    }
}

impl<R: EntityRegistry> ServerRoom<R> {
    /// Creates an empty room around a caller-supplied registry.
    #[must_use]
    pub fn with_registry(config: RoomConfig, host: impl ServerHost + 'static, registry: R) -> Self {
        Self::assemble(config, Box::new(host), registry, EntityPools::new(), Pool::new())
    }

    fn assemble(
        config: RoomConfig,
        host: Box<dyn ServerHost>,
        registry: R,
        entity_pools: EntityPools,
        event_pool: Pool<RoomEvent>,
    ) -> Self {
        Self {
            config,
            tick: Tick::INVALID,
            next_entity_id: EntityId::START,
            registry,
            entity_pools,
            event_pool,
            peers: PeerSet::new(),
            observers: Vec::new(),
            host,
            to_update: Vec::with_capacity(config.entity_capacity),
            to_remove: Vec::with_capacity(config.entity_capacity),
        }
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Declares entity type `T`, built with `T::default()`.
    pub fn register_entity<T: RoomEntity + Default>(&mut self) {
        self.entity_pools.register::<T>();
    }

    /// Declares entity type `T`, built by `factory`.
    ///
    /// If `T` is already registered its pool is kept and `factory` is ignored.
    pub fn register_entity_with<T, F>(&mut self, factory: F)
    where
        T: RoomEntity,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.entity_pools.register_with(factory);
    }

    /// Creates a `T` from its pool, assigns it the next id and adds it to
    /// the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::UnregisteredEntityType`] if `T` was never
    /// registered, or [`RoomError::EntityIdsExhausted`] once every id has
    /// been handed out.
    pub fn create_entity<T: RoomEntity>(&mut self) -> RoomResult<EntityId> {
        let id = self.next_entity_id;
        if !id.is_valid() {
            return Err(RoomError::EntityIdsExhausted);
        }

        let mut entity = self
            .entity_pools
            .allocate::<T>()
            .ok_or(RoomError::UnregisteredEntityType(type_name::<T>()))?;

        self.next_entity_id = id.next().unwrap_or(EntityId::INVALID);
        entity.core_mut().assign_id(id);
        self.registry.register(entity);

        trace!(entity = %id, kind = type_name::<T>(), "entity created");
        Ok(id)
    }

    /// Typed access to a live entity.
    #[must_use]
    pub fn entity<T: RoomEntity>(&self, id: EntityId) -> Option<&T> {
        self.registry.get(id)?.downcast_ref()
    }

    /// Typed mutable access to a live entity.
    #[must_use]
    pub fn entity_mut<T: RoomEntity>(&mut self, id: EntityId) -> Option<&mut T> {
        self.registry.get_mut(id)?.downcast_mut()
    }

    /// Flags a server entity for removal at the start of the next tick and
    /// records the removal with the host.
    ///
    /// Marking an entity that is already pending removal does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::UnknownEntity`] if `id` is not live, or
    /// [`RoomError::InvalidEntityKind`] if the entity is not server-owned.
    pub fn mark_for_removal(&mut self, id: EntityId) -> RoomResult<()> {
        let entity = self
            .registry
            .get_mut(id)
            .ok_or(RoomError::UnknownEntity(id))?;

        if entity.is_removing() {
            return Ok(());
        }

        let authority = entity.authority();
        if authority != Authority::Server {
            return Err(RoomError::InvalidEntityKind { id, authority });
        }

        entity.core_mut().mark_for_removal();
        self.host.log_removed_entity(entity, self.tick);
        Ok(())
    }

    /// Unregisters a remote entity and returns it to its pool immediately.
    ///
    /// Remote entities are never visited by the tick pipeline, so whoever
    /// replicates them releases them here when their owner drops them.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::UnknownEntity`] if `id` is not live, or
    /// [`RoomError::InvalidEntityKind`] for a server entity, which must go
    /// through [`ServerRoom::mark_for_removal`].
    pub fn remove_remote_entity(&mut self, id: EntityId) -> RoomResult<()> {
        let authority = self
            .registry
            .get(id)
            .ok_or(RoomError::UnknownEntity(id))?
            .authority();
        if authority != Authority::Remote {
            return Err(RoomError::InvalidEntityKind { id, authority });
        }

        if let Some(entity) = self.registry.unregister(id) {
            free(entity);
        }
        debug!(entity = %id, "remote entity released");
        Ok(())
    }

    // ========================================================================
    // Events & Peers
    // ========================================================================

    /// Allocates a reset event carrying the configured attempt count.
    #[must_use]
    pub fn create_event(&self) -> RoomEvent {
        let mut event = self.event_pool.allocate();
        event.attempts = self.config.broadcast_attempts;
        event
    }

    /// Sends `event` once to every connected peer.
    ///
    /// With `free_when_done` the event goes back to its pool and `None` is
    /// returned. Otherwise ownership returns to the caller. Events that no
    /// pool produced are dropped instead of freed.
    pub fn broadcast_event(
        &self,
        event: RoomEvent,
        attempts: u16,
        free_when_done: bool,
    ) -> Option<RoomEvent> {
        let sent = self.peers.broadcast(&event, attempts);
        trace!(kind = event.kind, sent, attempts, "event broadcast");

        if !free_when_done {
            return Some(event);
        }
        if event.stamp().is_stamped() {
            free(event);
        }
        None
    }

    /// [`ServerRoom::broadcast_event`] using the event's own settings.
    pub fn broadcast(&self, event: RoomEvent) -> Option<RoomEvent> {
        let (attempts, free_when_sent) = (event.attempts, event.free_when_sent);
        self.broadcast_event(event, attempts, free_when_sent)
    }

    /// Adds a peer and notifies observers.
    ///
    /// A peer already connected under the same id is replaced.
    pub fn add_client(&mut self, peer: Arc<dyn Peer>) {
        let id = peer.id();
        if self.peers.insert(peer).is_some() {
            debug!(peer = %id, "peer reconnected, replacing previous handle");
        }

        info!(peer = %id, peers = self.peers.len(), "client joined");
        for observer in &mut self.observers {
            observer.on_client_joined(id);
        }
    }

    /// Removes a peer and notifies observers.
    ///
    /// The peer is returned only after every observer has seen the leave,
    /// so control over its entities can be revoked strictly afterwards.
    pub fn remove_client(&mut self, id: PeerId) -> Option<Arc<dyn Peer>> {
        let peer = self.peers.remove(id)?;

        info!(peer = %id, peers = self.peers.len(), "client left");
        for observer in &mut self.observers {
            observer.on_client_left(id);
        }
        Some(peer)
    }

    /// Attaches an observer. Observers are notified in attachment order.
    pub fn add_observer(&mut self, observer: impl RoomObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ========================================================================
    // Tick Pipeline
    // ========================================================================

    /// Advances the room by one tick.
    pub fn server_tick(&mut self) {
        self.tick = self.tick.next();
        let tick = self.tick;

        for observer in &mut self.observers {
            observer.on_pre_tick(tick);
        }

        for entity in self.registry.entities() {
            if entity.authority() != Authority::Server {
                continue;
            }
            if entity.is_removing() {
                self.to_remove.push(entity.id());
            } else {
                self.to_update.push(entity.id());
            }
        }

        // Wave 0
        for &id in &self.to_remove {
            if let Some(entity) = self.registry.unregister(id) {
                free(entity);
            }
        }

        // Waves 1-3
        for &id in &self.to_update {
            if let Some(entity) = self.registry.get_mut(id) {
                entity.pre_update(tick);
            }
        }
        for &id in &self.to_update {
            if let Some(entity) = self.registry.get_mut(id) {
                entity.update(tick);
            }
        }
        for &id in &self.to_update {
            if let Some(entity) = self.registry.get_mut(id) {
                entity.post_update(tick);
            }
        }

        debug!(
            %tick,
            removed = self.to_remove.len(),
            updated = self.to_update.len(),
            "server tick"
        );
        self.to_remove.clear();
        self.to_update.clear();

        for observer in &mut self.observers {
            observer.on_post_tick(tick);
        }
    }

    /// Stores a record of the current tick on every live server entity.
    pub fn store_states(&mut self) {
        let tick = self.tick;
        for entity in self.registry.entities_mut() {
            if entity.authority() == Authority::Server {
                entity.store_record(tick);
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The last completed tick, [`Tick::INVALID`] before the first.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// This room's configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// The entity registry.
    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Connected peers.
    #[must_use]
    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    /// The event pool.
    #[must_use]
    pub fn event_pool(&self) -> &Pool<RoomEvent> {
        &self.event_pool
    }
}

impl<R: EntityRegistry + Default> ServerRoom<R> {
    /// Creates an empty room with the same configuration and entity types,
    /// drawing from fresh pools of its own.
    #[must_use]
    pub fn new_sibling(&self, host: impl ServerHost + 'static) -> Self {
        Self::assemble(
            self.config,
            Box::new(host),
            R::default(),
            self.entity_pools.clone_factory(),
            self.event_pool.clone_factory(),
        )
    }
}

impl<R: EntityRegistry> fmt::Debug for ServerRoom<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRoom")
            .field("tick", &self.tick)
            .field("entities", &self.registry.len())
            .field("peers", &self.peers)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
