// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! One-dimensional linear mapping between a channel range and a motor range.

use super::MixerError;

/// `y = k * x + d` in integer arithmetic.
///
/// The slope is computed from ranges pre-scaled by 256, so `k` is the integer quotient of the
/// output span over the input span, truncated toward zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinearMapper {
    k: i32,
    d: i32,
}

impl LinearMapper {
    /// Maps everything to zero. Stands in for a half-channel whose range is degenerate.
    pub const IDLE: Self = Self { k: 0, d: 0 };

    /// Build the mapper taking `in_min..in_max` onto `out_min..out_max`.
    ///
    /// The line passes exactly through `(in_max, out_max)`.
    pub fn new(in_min: i16, in_max: i16, out_min: i16, out_max: i16) -> Result<Self, MixerError> {
        let delta_in = (i32::from(in_max) - i32::from(in_min)) << 8;
        let delta_out = (i32::from(out_max) - i32::from(out_min)) << 8;
        if delta_in == 0 {
            return Err(MixerError::DegenerateRange);
        }

        let k = delta_out / delta_in;
        let d = i32::from(out_max) - k * i32::from(in_max);
        Ok(Self { k, d })
    }

    #[inline]
    pub fn slope(&self) -> i32 {
        self.k
    }

    #[inline]
    pub fn intercept(&self) -> i32 {
        self.d
    }

    /// Map `x`, truncating the result to 16 bits.
    #[inline]
    pub fn map(&self, x: i16) -> i16 {
        self.k.wrapping_mul(i32::from(x)).wrapping_add(self.d) as i16
    }
}
