//! # Tether Core
//!
//! Leaf primitives for an authoritative room server:
//! - [`Tick`] and [`EntityId`] sequences
//! - Identity-stamped object pools ([`Pool`]) for per-tick churn
//!
//! ## Architecture Rules
//!
//! 1. **Recycle on the hot path** - pooled objects are reset and reused
//! 2. **Fail fast** - pool identity mismatches panic
//! 3. **No networking knowledge** - rooms and codecs live in `tether_networking`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tether_core::{Pool, Poolable};
//!
//! let pool: Pool<Packet> = Pool::new();
//! let packet = pool.allocate();
//! tether_core::free(packet); // routed back to `pool` by its stamp
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ids;
pub mod memory;

pub use ids::{EntityId, Tick};
pub use memory::{drain, free, replace, Pool, PoolId, PoolStamp, Poolable};
