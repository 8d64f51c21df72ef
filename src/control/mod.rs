// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control
//!
//! The control-update routine that runs the input pipeline, and the operating state machine that
//! decides when its output reaches the motors.
//!
//! ## Modules
//!
//! - [`state`] - Operating states and the [`Supervisor`] that steps between them.
//!
//! The main loop is the only consumer of [`PulseEvent`]s, so at most one control update is ever
//! in flight:
//!
//! ```ignore
//! loop {
//!     control.drain(&mut pulses, &REGS, &mut motors);
//!     supervisor.step(&REGS, &mut motors, &mut transport, &mut store, now_ms());
//! }
//! ```

pub mod state;

pub use state::{OperatingState, Supervisor};

use heapless::spsc::Consumer;

use crate::filter::MovingAverage;
use crate::input::{PulseEvent, CHANNEL_NEUTRAL, FILTER_LEN, PULSE_QUEUE_LEN};
use crate::mixer::{Mixer, MixerOutput};
use crate::motors::{MotorControl, MotorId};
use crate::registers::Registers;

/// Per-channel filters plus the mixer.
pub struct ControlLoop {
    filters: [MovingAverage<FILTER_LEN>; 2],
    mixer: Mixer,
}

impl ControlLoop {
    pub const fn new() -> Self {
        Self {
            filters: [
                MovingAverage::new(CHANNEL_NEUTRAL),
                MovingAverage::new(CHANNEL_NEUTRAL),
            ],
            mixer: Mixer::new(),
        }
    }

    /// Feed one completed pulse and run a control update.
    ///
    /// Over-long pulses are dropped without an update.
    pub fn on_pulse<M: MotorControl>(
        &mut self,
        event: PulseEvent,
        regs: &Registers,
        motors: &mut M,
    ) -> Option<MixerOutput> {
        let Some(sample) = event.sample() else {
            crate::log_debug!("{} pulse of {} ticks dropped", event.channel, event.width);
            return None;
        };
        self.filters[event.channel.index()].push(sample);
        self.update(regs, motors)
    }

    /// Process every queued pulse. Returns how many were taken.
    pub fn drain<M: MotorControl>(
        &mut self,
        pulses: &mut Consumer<'_, PulseEvent, PULSE_QUEUE_LEN>,
        regs: &Registers,
        motors: &mut M,
    ) -> usize {
        let mut n = 0;
        while let Some(event) = pulses.dequeue() {
            self.on_pulse(event, regs, motors);
            n += 1;
        }
        n
    }

    /// One control update.
    ///
    /// With a calibration pending, the current filtered values become the neutral position and no
    /// motor command is produced. Otherwise both motors get the mixer's commands.
    pub fn update<M: MotorControl>(&mut self, regs: &Registers, motors: &mut M) -> Option<MixerOutput> {
        let config = regs.config();
        let samples = self.samples();

        if regs.take_calibration_request() {
            self.mixer.calibrate(samples, &config);
            return None;
        }

        let out = self.mixer.mix(samples, &config);
        motors.set(MotorId::Left, out.left);
        motors.set(MotorId::Right, out.right);
        Some(out)
    }

    /// Filtered value of both channels.
    pub fn samples(&self) -> [u16; 2] {
        [self.filters[0].value(), self.filters[1].value()]
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}

impl Default for ControlLoop {
    fn default() -> Self {
        Self::new()
    }
}
