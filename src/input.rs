// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Receiver signal acquisition.
//!
//! Each channel's pulse width is timed between a rising and the following falling edge against a
//! free-running 16-bit counter ticking every [`TICK_US`] µs. Completed pulses become
//! [`PulseEvent`]s, which the edge interrupt pushes into a [`PulseQueue`] for the control loop.
//!
//! A slower watchdog (the counter's overflow, every ~262 ms) counts completed pulses of both
//! channels. Too few pulses in one window means the remote is gone: signal-good drops and both
//! edge detectors go back to waiting for a rising edge.

use core::fmt;

use heapless::spsc::Queue;

/// Capture counter resolution.
pub const TICK_US: u32 = 4;

/// Longest accepted pulse (2.0 ms).
pub const MAX_PULSE_TICKS: u16 = 500;

/// Offset removed from every pulse (1.0 ms) so a 1.0–2.0 ms pulse becomes a 0..=250 sample.
pub const PULSE_OFFSET_TICKS: u16 = MAX_PULSE_TICKS >> 1;

/// Mid-scale sample (1.5 ms).
pub const CHANNEL_NEUTRAL: u16 = 125;

/// Top of the sample range (2.0 ms).
pub const CHANNEL_MAX: u16 = 250;

/// Moving-average window per channel.
pub const FILTER_LEN: usize = 4;

/// Fewer completed pulses than this in one watchdog window means signal loss.
///
/// One window is 65536 ticks (~262 ms); at 50 Hz that is ~13 pulses per channel, 26 in total.
pub const MIN_PULSES_PER_WINDOW: u8 = 20;

/// Capacity of the edge-to-control queue (one slot is kept free by the queue).
pub const PULSE_QUEUE_LEN: usize = 16;

/// Queue carrying completed pulses from the edge interrupt to the control loop.
pub type PulseQueue = Queue<PulseEvent, PULSE_QUEUE_LEN>;

/// Receiver input channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Channel {
    Ch1 = 0,
    Ch2 = 1,
}

impl Channel {
    pub const ALL: [Self; 2] = [Self::Ch1, Self::Ch2];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ch1 => f.write_str("ch1"),
            Self::Ch2 => f.write_str("ch2"),
        }
    }
}

/// Edge an edge detector is currently armed for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// A completed pulse, timestamped with the counter value of its falling edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PulseEvent {
    pub channel: Channel,
    /// Pulse width in counter ticks.
    pub width: u16,
    pub captured_at: u16,
}

impl PulseEvent {
    /// Convert the width to a channel sample (0..=250), or `None` for an over-long pulse.
    ///
    /// Pulses shorter than the offset saturate to 0.
    pub fn sample(&self) -> Option<u16> {
        pulse_to_sample(self.width)
    }
}

/// See [`PulseEvent::sample`].
pub fn pulse_to_sample(width: u16) -> Option<u16> {
    if width > MAX_PULSE_TICKS {
        return None;
    }
    Some(width.saturating_sub(PULSE_OFFSET_TICKS))
}

/// Rising/falling edge state machine of one channel.
#[derive(Copy, Clone, Debug)]
pub struct EdgeCapture {
    armed: Edge,
    rise_at: u16,
}

impl EdgeCapture {
    pub const fn new() -> Self {
        Self {
            armed: Edge::Rising,
            rise_at: 0,
        }
    }

    /// Edge the hardware should trigger on next.
    #[inline]
    pub fn armed(&self) -> Edge {
        self.armed
    }

    /// Handle the armed edge seen at counter value `now`.
    ///
    /// Returns the pulse width in ticks once the falling edge completes a pulse. The counter may
    /// wrap at most once per pulse.
    pub fn on_edge(&mut self, now: u16) -> Option<u16> {
        match self.armed {
            Edge::Rising => {
                self.rise_at = now;
                self.armed = Edge::Falling;
                None
            }
            Edge::Falling => {
                self.armed = Edge::Rising;
                Some(now.wrapping_sub(self.rise_at))
            }
        }
    }

    /// Forget any half-seen pulse and wait for a rising edge.
    pub fn reset(&mut self) {
        self.armed = Edge::Rising;
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one watchdog window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum SignalStatus {
    Good,
    Lost,
}

/// Edge detectors of both channels plus the signal-loss watchdog.
///
/// Shared between the edge interrupts and the watchdog interrupt; wrap it in a
/// [`Shared`](crate::sync::Shared) when those run at different priorities.
#[derive(Clone, Debug)]
pub struct SignalAcquisition {
    edges: [EdgeCapture; 2],
    pulses_in_window: u8,
    good: bool,
}

impl SignalAcquisition {
    pub const fn new() -> Self {
        Self {
            edges: [EdgeCapture::new(); 2],
            pulses_in_window: 0,
            good: false,
        }
    }

    /// Handle an edge on `channel` at counter value `now`.
    ///
    /// Every completed pulse counts towards the watchdog, whether or not its width is usable.
    pub fn on_edge(&mut self, channel: Channel, now: u16) -> Option<PulseEvent> {
        let width = self.edges[channel.index()].on_edge(now)?;
        self.pulses_in_window = self.pulses_in_window.saturating_add(1);
        Some(PulseEvent {
            channel,
            width,
            captured_at: now,
        })
    }

    /// Edge the hardware should trigger on next for `channel`.
    #[inline]
    pub fn armed(&self, channel: Channel) -> Edge {
        self.edges[channel.index()].armed()
    }

    /// Close the current watchdog window.
    pub fn on_watchdog(&mut self) -> SignalStatus {
        let status = if self.pulses_in_window < MIN_PULSES_PER_WINDOW {
            for edge in &mut self.edges {
                edge.reset();
            }
            SignalStatus::Lost
        } else {
            SignalStatus::Good
        };

        let good = status == SignalStatus::Good;
        if good != self.good {
            if good {
                crate::log_info!("signal good ({} pulses)", self.pulses_in_window);
            } else {
                crate::log_warn!("signal lost ({} pulses)", self.pulses_in_window);
            }
        }
        self.good = good;
        self.pulses_in_window = 0;
        status
    }

    #[inline]
    pub fn signal_good(&self) -> bool {
        self.good
    }

    #[inline]
    pub fn pulses_in_window(&self) -> u8 {
        self.pulses_in_window
    }
}

impl Default for SignalAcquisition {
    fn default() -> Self {
        Self::new()
    }
}
