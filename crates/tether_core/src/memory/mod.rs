//! # Memory Management
//!
//! Recycling pools for objects created and destroyed every tick.
//!
//! ## Design Philosophy
//!
//! Steady-state ticks should not touch the global allocator:
//! - Entities, events and records are recycled, not dropped
//! - Objects remember which pool produced them
//! - Returning an object to the wrong pool is a bug, so it panics

mod pool;

pub use pool::{drain, free, replace, Pool, PoolId, PoolStamp, Poolable};
