// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host test bench: the full ESC pipeline with recording pins, a loopback transport and a RAM
//! config store in place of the board.

#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use antweight_esc::config::{self, ConfigurationRecord, MemoryStore};
use antweight_esc::control::{ControlLoop, OperatingState, Supervisor};
use antweight_esc::input::{
    Channel, PulseQueue, SignalAcquisition, SignalStatus, MIN_PULSES_PER_WINDOW, PULSE_OFFSET_TICKS,
};
use antweight_esc::motors::{BridgeLegs, CompareTimer, MotorCommand, MotorControl, MotorId, MotorPwm};
use antweight_esc::protocol::LoopbackTransport;
use antweight_esc::registers::Registers;
use embedded_hal::digital::v2::OutputPin;

/// Output line whose level the test can observe.
#[derive(Clone, Default)]
pub struct Line(Rc<Cell<bool>>);

impl Line {
    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl OutputPin for Line {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTimer {
    pub compare: [Option<u8>; 2],
}

impl CompareTimer for RecordingTimer {
    fn set_compare(&mut self, motor: MotorId, at: Option<u8>) {
        self.compare[motor.index()] = at;
    }
}

pub type BenchMotors = MotorPwm<BridgeLegs<Line, Line>, BridgeLegs<Line, Line>, RecordingTimer>;

/// Capture ticks between two receiver frames (20 ms).
pub const FRAME_TICKS: u16 = 5000;

pub struct Bench {
    pub regs: Registers,
    pub acquisition: SignalAcquisition,
    pub control: ControlLoop,
    pub supervisor: Supervisor,
    pub motors: BenchMotors,
    /// Left forward, left backward, right forward, right backward.
    pub lines: [Line; 4],
    pub transport: LoopbackTransport,
    pub store: MemoryStore,
    queue: PulseQueue,
    clock: u16,
    now_ms: u32,
}

impl Bench {
    /// Boot with whatever `store` holds.
    pub fn boot(mut store: MemoryStore) -> Self {
        let record = config::load_or_init(&mut store).unwrap_or(ConfigurationRecord::DEFAULT);
        let lines: [Line; 4] = Default::default();
        let motors = MotorPwm::new(
            BridgeLegs::new(lines[0].clone(), lines[1].clone()),
            BridgeLegs::new(lines[2].clone(), lines[3].clone()),
            RecordingTimer::default(),
        );
        Self {
            regs: Registers::new(record),
            acquisition: SignalAcquisition::new(),
            control: ControlLoop::new(),
            supervisor: Supervisor::default(),
            motors,
            lines,
            transport: LoopbackTransport::new(),
            store,
            queue: PulseQueue::new(),
            clock: 0,
            now_ms: 0,
        }
    }

    pub fn fresh() -> Self {
        Self::boot(MemoryStore::erased())
    }

    /// One receiver frame: a pulse on each channel, then the main loop drains the queue.
    pub fn frame(&mut self, ch1: u16, ch2: u16) {
        let (mut producer, mut consumer) = self.queue.split();
        for (channel, sample) in [(Channel::Ch1, ch1), (Channel::Ch2, ch2)] {
            let width = sample + PULSE_OFFSET_TICKS;
            assert!(self.acquisition.on_edge(channel, self.clock).is_none());
            let event = self
                .acquisition
                .on_edge(channel, self.clock.wrapping_add(width))
                .expect("falling edge completes a pulse");
            producer.enqueue(event).expect("queue has room");
        }
        self.clock = self.clock.wrapping_add(FRAME_TICKS);
        self.now_ms += 20;
        self.control
            .drain(&mut consumer, &self.regs, &mut self.motors);
    }

    /// Close a watchdog window and publish the result.
    pub fn watchdog(&mut self) -> SignalStatus {
        let status = self.acquisition.on_watchdog();
        self.regs.set_signal_good(status == SignalStatus::Good);
        status
    }

    /// Enough frames for one good watchdog window.
    pub fn window(&mut self, ch1: u16, ch2: u16) -> SignalStatus {
        for _ in 0..MIN_PULSES_PER_WINDOW / 2 {
            self.frame(ch1, ch2);
        }
        self.watchdog()
    }

    pub fn step(&mut self) -> OperatingState {
        self.supervisor.step(
            &self.regs,
            &mut self.motors,
            &mut self.transport,
            &mut self.store,
            self.now_ms,
        )
    }

    /// Signal up at neutral, calibrated, ACTIVE.
    pub fn bring_up(&mut self) {
        assert_eq!(self.window(125, 125), SignalStatus::Good);
        assert_eq!(self.step(), OperatingState::Init);
        self.frame(125, 125);
        assert_eq!(self.step(), OperatingState::Active);
    }

    /// Run one PWM period: overflow, then every scheduled compare in order.
    pub fn pwm_period(&mut self) {
        self.motors.on_overflow();
        let mut order: Vec<(u8, MotorId)> = MotorId::ALL
            .iter()
            .filter_map(|&m| self.motors.timer().compare[m.index()].map(|at| (at, m)))
            .collect();
        order.sort_by_key(|&(at, _)| at);
        for (_, motor) in order {
            self.motors.on_compare(motor);
        }
    }

    pub fn command(&self, motor: MotorId) -> MotorCommand {
        self.motors.command(motor)
    }

    /// (forward, backward) line levels of `motor`.
    pub fn lines(&self, motor: MotorId) -> (bool, bool) {
        let i = motor.index() * 2;
        (self.lines[i].is_high(), self.lines[i + 1].is_high())
    }

    pub fn advance_ms(&mut self, ms: u32) {
        self.now_ms += ms;
    }
}
