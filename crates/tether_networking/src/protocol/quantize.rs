//! # Float Quantization
//!
//! Compresses a bounded float into the fewest bits that still resolve it at
//! a fixed precision.
//!
//! ```text
//! value ──clamp──▶ [min, max] ──(v - min) / precision──▶ bucket ──mask──▶ u32
//! u32 ──▶ min + data * precision ──clamp──▶ value
//! ```
//!
//! Out-of-range input is not an error. It is redefined as the nearest bound,
//! which is the whole point of a bounded codec.

use crate::error::CodecError;

/// Smallest accepted precision, in `f32` ulps at the range's largest magnitude.
///
/// Leaves enough headroom for the float rounding in pack and unpack that a
/// round trip always stays within one precision step.
const RESOLUTION_HEADROOM: f32 = 64.0;

/// A lossy codec between a value and a fixed-width unsigned integer.
///
/// Encoder and decoder must agree on [`Encoder::required_bits`]; it is the
/// field's wire footprint.
pub trait Encoder {
    /// The decoded value type.
    type Value;

    /// Width of every packed value, in bits.
    fn required_bits(&self) -> u32;

    /// Packs `value` into the low `required_bits` bits of a `u32`.
    fn pack(&self, value: Self::Value) -> u32;

    /// Recovers an approximation of the packed value.
    fn unpack(&self, data: u32) -> Self::Value;
}

/// Quantizes floats in `[min_value, max_value]` to steps of `precision`.
///
/// # Example
///
/// ```rust,ignore
/// let codec = FloatCodec::new(-10.0, 10.0, 0.5)?;
/// assert_eq!(codec.required_bits(), 6);
/// assert_eq!(codec.pack(10.3), codec.pack(10.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatCodec {
    min_value: f32,
    max_value: f32,
    precision: f32,
    inv_precision: f32,
    required_bits: u32,
    mask: u32,
}

impl FloatCodec {
    /// Builds a codec, precomputing its bit width and mask.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if any parameter is non-finite, the
    /// precision is not positive, `min_value >= max_value`, the range
    /// would need more than 32 bits, or the precision is too fine for `f32`
    /// to resolve at the ends of the range.
    pub fn new(min_value: f32, max_value: f32, precision: f32) -> Result<Self, CodecError> {
        if !(min_value.is_finite() && max_value.is_finite() && precision.is_finite()) {
            return Err(CodecError::NonFinite);
        }
        if precision <= 0.0 {
            return Err(CodecError::NonPositivePrecision(precision));
        }
        if min_value >= max_value {
            return Err(CodecError::EmptyRange {
                min: min_value,
                max: max_value,
            });
        }

        let inv_precision = 1.0 / precision;
        let required_bits = Self::compute_required_bits(max_value - min_value, inv_precision);
        if required_bits > u32::BITS {
            return Err(CodecError::TooManyBits(required_bits));
        }

        let minimum = Self::minimum_precision(min_value, max_value);
        if precision < minimum {
            return Err(CodecError::PrecisionBelowResolution { precision, minimum });
        }

        let mask = ((1_u64 << required_bits) - 1) as u32;

        Ok(Self {
            min_value,
            max_value,
            precision,
            inv_precision,
            required_bits,
            mask,
        })
    }

    /// Bit width of the largest bucket index, `floor(log2(n)) + 1`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn compute_required_bits(range: f32, inv_precision: f32) -> u32 {
        let top_bucket = (range * inv_precision + 0.5) as u64;
        (u64::BITS - top_bucket.leading_zeros()).max(1)
    }

    /// Finest precision a round trip can honour over `[min_value, max_value]`.
    fn minimum_precision(min_value: f32, max_value: f32) -> f32 {
        let magnitude = min_value.abs().max(max_value.abs());
        let ulp = f32::from_bits(magnitude.to_bits() + 1) - magnitude;
        ulp * RESOLUTION_HEADROOM
    }

    /// Lower bound of the codec's range.
    #[inline]
    #[must_use]
    pub const fn min_value(&self) -> f32 {
        self.min_value
    }

    /// Upper bound of the codec's range.
    #[inline]
    #[must_use]
    pub const fn max_value(&self) -> f32 {
        self.max_value
    }

    /// Quantization step.
    #[inline]
    #[must_use]
    pub const fn precision(&self) -> f32 {
        self.precision
    }

    /// Width of every packed value, in bits.
    #[inline]
    #[must_use]
    pub const fn required_bits(&self) -> u32 {
        self.required_bits
    }

    /// Largest value [`FloatCodec::pack`] can return.
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    /// Packs `value` into a bucket index.
    ///
    /// Values outside the range pack as the nearest bound; NaN packs as
    /// bucket 0.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pack(&self, value: f32) -> u32 {
        let value = value.clamp(self.min_value, self.max_value);
        let adjusted = (value - self.min_value) * self.inv_precision;
        ((adjusted + 0.5) as u32) & self.mask
    }

    /// Unpacks a bucket index, clamping so that corrupt or out-of-mask
    /// input still yields an in-range value.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unpack(&self, data: u32) -> f32 {
        let adjusted = data as f32 * self.precision + self.min_value;
        adjusted.clamp(self.min_value, self.max_value)
    }
}

impl Encoder for FloatCodec {
    type Value = f32;

    fn required_bits(&self) -> u32 {
        self.required_bits
    }

    fn pack(&self, value: f32) -> u32 {
        FloatCodec::pack(self, value)
    }

    fn unpack(&self, data: u32) -> f32 {
        FloatCodec::unpack(self, data)
    }
}
