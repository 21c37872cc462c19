//! # Networking Error Types
//!
//! Recoverable failures surfaced to callers. Invariant violations (pool
//! corruption) are panics and never appear here.

use std::path::PathBuf;

use tether_core::EntityId;
use thiserror::Error;

use crate::server::Authority;

/// Errors returned by [`ServerRoom`](crate::server::ServerRoom) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// No live entity has this identity.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The entity exists but its authority does not allow the operation.
    #[error("entity {id} has {authority:?} authority, which does not allow this operation")]
    InvalidEntityKind {
        /// The offending entity.
        id: EntityId,
        /// Its declared authority.
        authority: Authority,
    },

    /// `create_entity` was called for a type with no registered pool.
    #[error("entity type {0} was never registered with the room")]
    UnregisteredEntityType(&'static str),

    /// Every `EntityId` this room can hand out has been used.
    #[error("entity ids exhausted")]
    EntityIdsExhausted,
}

/// Errors from constructing a [`FloatCodec`](crate::protocol::FloatCodec).
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CodecError {
    /// A bound or the precision is NaN or infinite.
    #[error("codec parameters must be finite")]
    NonFinite,

    /// Precision must be strictly positive.
    #[error("precision must be positive, got {0}")]
    NonPositivePrecision(f32),

    /// The range is empty or inverted.
    #[error("empty range: min {min} must be below max {max}")]
    EmptyRange {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// Range divided by precision does not fit in a 32-bit word.
    #[error("range needs {0} bits, at most 32 are supported")]
    TooManyBits(u32),

    /// The precision is finer than `f32` can resolve at the range's ends.
    #[error("precision {precision} is below the resolution of this range, minimum is {minimum}")]
    PrecisionBelowResolution {
        /// Requested precision.
        precision: f32,
        /// Smallest precision accepted for this range.
        minimum: f32,
    },
}

/// Errors from loading a [`NetConfig`](crate::config::NetConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML was malformed or had the wrong shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No codec with this name is configured.
    #[error("no codec named {0:?}")]
    UnknownCodec(String),

    /// A configured codec has invalid parameters.
    #[error("codec {name:?}: {source}")]
    Codec {
        /// Codec name in the config.
        name: String,
        /// Why construction failed.
        #[source]
        source: CodecError,
    },
}

/// Result type for room operations.
pub type RoomResult<T> = Result<T, RoomError>;
