// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Plane ("RST") mixer.
//!
//! A motor's command is modelled as a plane over the two stick axes:
//!
//! ```text
//! motor(ch1, ch2) = r - s * ch1 - t * ch2
//! ```
//!
//! The coefficients come from three calibration points `(ch1, ch2, motor)` measured off-device.
//! With `n = (P1 - P2) x (P1 - P3)` and `d = n . P1`:
//!
//! ```text
//! r = d / n.z,  s = n.x / n.z,  t = n.y / n.z
//! ```

use super::MixerError;

/// A calibration point: stick position and the motor value wanted there.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point3 {
    pub ch1: i32,
    pub ch2: i32,
    pub motor: i32,
}

impl Point3 {
    pub const fn new(ch1: i32, ch2: i32, motor: i32) -> Self {
        Self { ch1, ch2, motor }
    }
}

/// Plane coefficients of one motor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaneMixer {
    pub r: i32,
    pub s: i32,
    pub t: i32,
}

impl PlaneMixer {
    /// The flat plane: every stick position maps to 0.
    pub const ZERO: Self = Self { r: 0, s: 0, t: 0 };

    pub const fn new(r: i32, s: i32, t: i32) -> Self {
        Self { r, s, t }
    }

    /// Derive the plane through three points.
    ///
    /// Fails with [`MixerError::DegeneratePlane`] when the points are collinear or the plane is
    /// vertical (`n.z == 0`), i.e. when it cannot be written as a function of the stick position.
    pub fn from_points(p1: Point3, p2: Point3, p3: Point3) -> Result<Self, MixerError> {
        let a = [
            i64::from(p1.ch1) - i64::from(p2.ch1),
            i64::from(p1.ch2) - i64::from(p2.ch2),
            i64::from(p1.motor) - i64::from(p2.motor),
        ];
        let b = [
            i64::from(p1.ch1) - i64::from(p3.ch1),
            i64::from(p1.ch2) - i64::from(p3.ch2),
            i64::from(p1.motor) - i64::from(p3.motor),
        ];

        let nx = a[1] * b[2] - a[2] * b[1];
        let ny = a[2] * b[0] - a[0] * b[2];
        let nz = a[0] * b[1] - a[1] * b[0];
        if nz == 0 {
            return Err(MixerError::DegeneratePlane);
        }
        let d = nx * i64::from(p1.ch1) + ny * i64::from(p1.ch2) + nz * i64::from(p1.motor);

        let narrow = |v: i64| i32::try_from(v).map_err(|_| MixerError::DegeneratePlane);
        Ok(Self {
            r: narrow(d / nz)?,
            s: narrow(nx / nz)?,
            t: narrow(ny / nz)?,
        })
    }

    /// Evaluate the plane at a (neutral-corrected) stick position.
    #[inline]
    pub fn map(&self, ch1: i16, ch2: i16) -> i32 {
        self.r
            .wrapping_sub(self.s.wrapping_mul(i32::from(ch1)))
            .wrapping_sub(self.t.wrapping_mul(i32::from(ch2)))
    }
}
