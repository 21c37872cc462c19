//! # Tether Networking - The Authoritative Room
//!
//! Server-side core of a client/server state-synchronization library.
//!
//! ## Architecture
//!
//! - **Room**: fixed-order tick pipeline over a registry of pooled entities
//! - **Peers**: connected participants and pooled event fan-out
//! - **Protocol**: bounded float quantization for compact state fields
//! - **Config**: TOML room tuning and named codecs
//!
//! Transport, packet framing and client-side prediction live elsewhere;
//! this crate only decides what happens on the server each tick.
//!
//! ## Tick Order
//!
//! ```text
//! tick N:   on_pre_tick ─▶ remove flagged ─▶ pre_update ─▶ update ─▶ post_update ─▶ on_post_tick
//!                              ▲
//! tick N-1: mark_for_removal ──┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tether_networking::{NetConfig, ServerRoom, TickLoop, TracingHost};
//!
//! let config = NetConfig::load("tether.toml")?;
//! let mut room = ServerRoom::new(config.room, TracingHost);
//! room.register_entity::<Avatar>();
//!
//! let mut ticks = TickLoop::from_config(&config.room);
//! loop {
//!     ticks.run_pending(&mut room);
//!     ticks.wait_for_next_tick();
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

// Re-exports for convenience
pub use config::{CodecConfig, NetConfig, RoomConfig};
pub use error::{CodecError, ConfigError, RoomError, RoomResult};
pub use protocol::{Encoder, FloatCodec};
pub use server::{
    Authority, ChannelObserver, EntityCore, EntityRegistry, OrderedRegistry, Peer, PeerId,
    PeerSet, RoomEntity, RoomEvent, RoomNotification, RoomObserver, ServerHost, ServerRoom,
    TickLoop, TracingHost,
};
pub use tether_core::{EntityId, Tick};
