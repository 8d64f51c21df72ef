// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Moving-average filter for channel samples.
//!
//! Fixed-size ring buffer; does not allocate and is never resized.

/// Moving average over the last `N` samples.
#[derive(Clone, Debug)]
pub struct MovingAverage<const N: usize> {
    samples: [u16; N],
    cursor: usize,
}

impl<const N: usize> MovingAverage<N> {
    const NON_EMPTY: () = assert!(N > 0, "filter window must hold at least one sample");

    /// Create a filter with every slot pre-filled with `init`, so the first reads are not biased
    /// towards zero.
    pub const fn new(init: u16) -> Self {
        let () = Self::NON_EMPTY;
        Self {
            samples: [init; N],
            cursor: 0,
        }
    }

    /// Overwrite the oldest sample with `value`.
    pub fn push(&mut self, value: u16) {
        self.samples[self.cursor] = value;
        self.cursor = (self.cursor + 1) % N;
    }

    /// Average of the window, truncating.
    pub fn value(&self) -> u16 {
        let sum: u32 = self.samples.iter().map(|&s| u32::from(s)).sum();
        (sum / N as u32) as u16
    }

    /// Refill every slot with `value`.
    pub fn reset(&mut self, value: u16) {
        self.samples = [value; N];
        self.cursor = 0;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        N
    }
}
