//! # Networking Configuration
//!
//! Room tuning and named codec parameters, loaded from TOML.
//!
//! ```toml
//! [room]
//! tick_rate = 30
//! broadcast_attempts = 5
//!
//! [codecs.position]
//! min = -512.0
//! max = 512.0
//! precision = 0.01
//! ```
//!
//! Every field has a default, so an empty document is a valid config.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::FloatCodec;

/// Simulation steps per second.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Top-level configuration document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetConfig {
    /// Room tuning.
    pub room: RoomConfig,
    /// Named codec parameters.
    pub codecs: BTreeMap<String, CodecConfig>,
}

/// Per-room tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoomConfig {
    /// Ticks per second driven by [`TickLoop`](crate::server::TickLoop).
    pub tick_rate: u32,
    /// Send attempts stamped on events from `create_event`.
    pub broadcast_attempts: u16,
    /// Expected live entities; sizes the per-tick scratch buffers.
    pub entity_capacity: usize,
    /// Ticks between `store_states` calls in the tick loop. Zero disables.
    pub store_interval: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            broadcast_attempts: crate::server::DEFAULT_EVENT_ATTEMPTS,
            entity_capacity: 256,
            store_interval: 1,
        }
    }
}

/// Parameters of one [`FloatCodec`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Quantization step.
    pub precision: f32,
}

impl NetConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), codecs = config.codecs.len(), "loaded config");
        Ok(config)
    }

    /// Builds the codec configured under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCodec`] if no such codec exists, or
    /// [`ConfigError::Codec`] if its parameters are invalid.
    pub fn codec(&self, name: &str) -> Result<FloatCodec, ConfigError> {
        let params = self
            .codecs
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCodec(name.to_owned()))?;

        FloatCodec::new(params.min, params.max, params.precision).map_err(|source| {
            ConfigError::Codec {
                name: name.to_owned(),
                source,
            }
        })
    }
}
