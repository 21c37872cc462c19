//! # Wire Primitives
//!
//! The only wire-level concern owned here is field quantization. Placing
//! packed values into packets belongs to the state serializer.
//!
//! ## Design Philosophy
//!
//! - Every bit counts - fields are bounded and quantized
//! - Encoder and decoder derive the same width from the same parameters
//! - Lossy by construction, never by accident

mod quantize;

pub use quantize::{Encoder, FloatCodec};
