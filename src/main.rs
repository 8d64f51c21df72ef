// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use defmt_rtt as _;
use heapless::spsc::Producer;
use panic_halt as _;
use static_cell::StaticCell;

use hal::{
    gpio::{gpioa, gpiod, Floating, Input, Output, PushPull},
    pac::{self, interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use antweight_esc::config::{self, ConfigurationRecord};
use antweight_esc::control::{ControlLoop, Supervisor};
use antweight_esc::hw::{usart::BAUD_RATE, BoardPins, CaptureTimer, EdgeInput, FlashStore, PwmTimer, Usart};
use antweight_esc::input::{Channel, PulseEvent, PulseQueue, SignalAcquisition, SignalStatus, PULSE_QUEUE_LEN};
use antweight_esc::motors::{BridgeLegs, MotorId, MotorPwm};
use antweight_esc::registers::Registers;
use antweight_esc::sync::Shared;
use antweight_esc::{log_error, log_info, log_warn};

type Motors = MotorPwm<
    BridgeLegs<gpiod::PD12<Output<PushPull>>, gpiod::PD13<Output<PushPull>>>,
    BridgeLegs<gpiod::PD14<Output<PushPull>>, gpiod::PD15<Output<PushPull>>>,
    PwmTimer,
>;

struct Inputs {
    ch1: EdgeInput<gpioa::PA0<Input<Floating>>>,
    ch2: EdgeInput<gpioa::PA1<Input<Floating>>>,
}

static REGS: Registers = Registers::new(ConfigurationRecord::DEFAULT);
static ACQUISITION: Shared<SignalAcquisition> = Shared::new(SignalAcquisition::new());

static CAPTURE: Shared<Option<CaptureTimer<pac::TIM2>>> = Shared::new(None);
static INPUTS: Shared<Option<Inputs>> = Shared::new(None);
static PRODUCER: Shared<Option<Producer<'static, PulseEvent, PULSE_QUEUE_LEN>>> = Shared::new(None);
static MOTOR_HANDLE: Shared<Option<&'static Shared<Motors>>> = Shared::new(None);

static PULSES: StaticCell<PulseQueue> = StaticCell::new();
static MOTORS: StaticCell<Shared<Motors>> = StaticCell::new();

/// PWM periods since boot (~1.024 ms each).
static MILLIS: AtomicU32 = AtomicU32::new(0);

#[entry]
fn main() -> ! {
    // Peripherals
    let Some(dp) = pac::Peripherals::take() else {
        panic!("peripherals taken twice");
    };

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let mut apb2 = rcc.apb2;
    let mut syscfg = dp.SYSCFG;
    let mut exti = dp.EXTI;

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOD);
    let _driver = pins.driver;

    // Configuration
    let mut store = FlashStore::new(dp.FLASH);
    let record = config::load_or_init(&mut store).unwrap_or_else(|e| {
        log_error!("{}, running on factory defaults", e);
        ConfigurationRecord::DEFAULT
    });
    REGS.set_config(record);

    // USART1 (configuration link)
    let usart_cfg = Config {
        baud_rate: BAUD_RATE.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (pins.usart1.tx, pins.usart1.rx), &clocks, usart_cfg);
    let mut transport = Usart::new(serial);

    // Motors
    let motors: &'static Shared<Motors> = MOTORS.init(Shared::new(MotorPwm::new(
        BridgeLegs::new(pins.left.forward, pins.left.backward),
        BridgeLegs::new(pins.right.forward, pins.right.backward),
        PwmTimer::tim4(dp.TIM4, &clocks),
    )));
    MOTOR_HANDLE.replace(Some(motors));

    // Pulse queue
    let (producer, mut consumer) = PULSES.init(PulseQueue::new()).split();
    PRODUCER.replace(Some(producer));

    // Receiver inputs and capture counter
    INPUTS.replace(Some(Inputs {
        ch1: EdgeInput::new(pins.receiver.ch1, &mut syscfg, &mut exti, &mut apb2),
        ch2: EdgeInput::new(pins.receiver.ch2, &mut syscfg, &mut exti, &mut apb2),
    }));
    CAPTURE.replace(Some(CaptureTimer::tim2(dp.TIM2, &clocks)));

    unsafe {
        NVIC::unmask(pac::Interrupt::EXTI0);
        NVIC::unmask(pac::Interrupt::EXTI1);
        NVIC::unmask(pac::Interrupt::TIM2);
        NVIC::unmask(pac::Interrupt::TIM4);
    }

    log_info!("antweight esc up, mode {}", record.control);

    let mut control = ControlLoop::new();
    let mut supervisor = Supervisor::default();
    let mut outputs = motors;

    loop {
        control.drain(&mut consumer, &REGS, &mut outputs);
        supervisor.step(
            &REGS,
            &mut outputs,
            &mut transport,
            &mut store,
            MILLIS.load(Ordering::Relaxed),
        );
    }
}

/// Time an edge on `channel` and queue the pulse it completes.
fn on_edge(channel: Channel) {
    let Some(now) = CAPTURE.with(|c| c.as_ref().map(|c| c.now())) else {
        return;
    };
    let edge = INPUTS.with_mut(|inputs| {
        inputs.as_mut().map(|i| match channel {
            Channel::Ch1 => i.ch1.service(),
            Channel::Ch2 => i.ch2.service(),
        })
    });
    let Some(edge) = edge else {
        return;
    };

    let event = ACQUISITION.with_mut(|acq| {
        if acq.armed(channel) == edge {
            acq.on_edge(channel, now)
        } else {
            None
        }
    });

    if let Some(event) = event {
        let queued = PRODUCER.with_mut(|p| p.as_mut().map(|p| p.enqueue(event).is_ok()));
        if queued == Some(false) {
            log_warn!("pulse queue full, {} pulse dropped", channel);
        }
    }
}

#[interrupt]
fn EXTI0() {
    on_edge(Channel::Ch1);
}

#[interrupt]
fn EXTI1() {
    on_edge(Channel::Ch2);
}

/// Capture counter wrapped: close a watchdog window.
#[interrupt]
fn TIM2() {
    let wrapped = CAPTURE.with_mut(|c| c.as_mut().map_or(false, |c| c.take_overflow()));
    if wrapped {
        let status = ACQUISITION.with_mut(|acq| acq.on_watchdog());
        REGS.set_signal_good(status == SignalStatus::Good);
    }
}

#[interrupt]
fn TIM4() {
    let Some(motors) = MOTOR_HANDLE.get() else {
        return;
    };
    let events = motors.with_mut(|m| {
        let events = m.timer_mut().take_events();
        if events.overflow {
            m.on_overflow();
        }
        for motor in MotorId::ALL {
            if events.compare[motor.index()] {
                m.on_compare(motor);
            }
        }
        events
    });
    if events.overflow {
        MILLIS.fetch_add(1, Ordering::Relaxed);
    }
}
