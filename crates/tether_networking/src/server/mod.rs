//! # Tether Server
//!
//! The authoritative side of a room.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        SERVER ROOM                        │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐     │
//! │  │ Entity Pools │  │ Tick Pipeline│  │ Peer Set     │     │
//! │  │ (per type)   │──│ (waves 0..3) │  │ (broadcast)  │     │
//! │  └──────────────┘  └──────────────┘  └──────────────┘     │
//! │         │                 │                 │             │
//! │         └─────────────────┼─────────────────┘             │
//! │                           │                               │
//! │               ┌───────────▼───────────┐                   │
//! │               │ Entity Registry       │                   │
//! │               │ - live entities by id │                   │
//! │               │ - stable iteration    │                   │
//! │               └───────────────────────┘                   │
//! └───────────────────────────────────────────────────────────┘
//!          │ ServerHost (audit)      │ RoomObserver (hooks)
//! ```
//!
//! The room is single-threaded: every mutating operation takes `&mut self`,
//! so nothing can create or remove entities while a tick is running.

mod entity;
mod event;
mod factory;
mod host;
mod observer;
mod peers;
mod registry;
mod room;
mod tick;

pub use entity::{AsAny, Authority, EntityCore, RoomEntity};
pub use event::{RoomEvent, DEFAULT_EVENT_ATTEMPTS};
pub use factory::{EntityPool, EntityPools};
pub use host::{ServerHost, TracingHost};
pub use observer::{ChannelObserver, RoomNotification, RoomObserver};
pub use peers::{Peer, PeerId, PeerSet};
pub use registry::{EntityRegistry, OrderedRegistry};
pub use room::ServerRoom;
pub use tick::{TickLoop, TickStats};
