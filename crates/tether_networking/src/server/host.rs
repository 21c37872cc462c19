//! # Server Host
//!
//! The room's link to the process hosting it.

use tether_core::Tick;
use tracing::info;

use super::entity::RoomEntity;

/// Services the hosting server provides to its rooms.
pub trait ServerHost: Send {
    /// Audit record for an entity accepted for removal. Called once per
    /// entity, at the moment it is marked, with the tick it was marked in.
    fn log_removed_entity(&mut self, entity: &dyn RoomEntity, tick: Tick);
}

/// Host that writes the removal audit to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingHost;

impl ServerHost for TracingHost {
    fn log_removed_entity(&mut self, entity: &dyn RoomEntity, tick: Tick) {
        info!(entity = %entity.id(), %tick, "entity marked for removal");
    }
}
