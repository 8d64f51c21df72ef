// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-tool conversations with a device sitting in INIT.

mod common;

use antweight_esc::config::{ChannelRange, ConfigurationRecord, ControlMode, MemoryStore};
use antweight_esc::control::OperatingState;
use antweight_esc::mixer::{PlaneMixer, Point3};
use antweight_esc::motors::{MotorCommand, MotorId};
use antweight_esc::protocol::messages::{
    MixerCoefficients, MAX_WRITE_LEN, MSG_NOK, MSG_OK, READ_REPLY_LEN, REQUEST_READ,
};
use antweight_esc::protocol::session::TRANSACTION_TIMEOUT_MS;
use antweight_esc::protocol::{ReadReply, WriteRequest};

use common::Bench;

fn read(bench: &mut Bench) -> ReadReply {
    bench.transport.inject(&[REQUEST_READ]);
    assert_eq!(bench.step(), OperatingState::Config);
    assert_eq!(bench.step(), OperatingState::Init);
    let sent = bench.transport.take_sent();
    let mut reply = [0u8; READ_REPLY_LEN];
    reply.copy_from_slice(&sent);
    ReadReply::decode(&reply).expect("OK reply")
}

fn write(bench: &mut Bench, request: &WriteRequest) -> u8 {
    let mut buf = [0u8; MAX_WRITE_LEN];
    let n = request.encode(&mut buf);
    bench.transport.inject(&buf[..n]);
    assert_eq!(bench.step(), OperatingState::Config);
    assert_eq!(bench.step(), OperatingState::Init);
    let sent = bench.transport.take_sent();
    assert_eq!(sent.len(), 1);
    sent[0]
}

/// Host-side derivation of the left plane: full ch1 or full ch2 drives forward.
fn derived_request() -> WriteRequest {
    let left = PlaneMixer::from_points(
        Point3::new(0, 0, 0),
        Point3::new(125, 0, 8125),
        Point3::new(0, 125, 8125),
    )
    .expect("points span a plane");
    WriteRequest {
        control: ControlMode::Delta,
        deadzone: 10,
        ch1: ChannelRange { min: 5, max: 245 },
        ch2: ChannelRange { min: 6, max: 244 },
        mixer: Some(MixerCoefficients {
            r1: left.r,
            r2: left.r,
            s1: left.s,
        }),
    }
}

#[test]
fn first_boot_reads_factory_defaults() {
    let mut bench = Bench::fresh();
    assert_eq!(bench.store.writes(), 1);

    let reply = read(&mut bench);
    assert_eq!(reply, ReadReply::from_record(&ConfigurationRecord::DEFAULT));
    assert_eq!(reply.encode(), [0x01, 0x02, 5, 0, 250, 0, 250]);
}

#[test]
fn read_is_idempotent() {
    let mut bench = Bench::fresh();
    assert_eq!(read(&mut bench), read(&mut bench));
}

#[test]
fn write_round_trips_and_survives_reboot() {
    let mut bench = Bench::fresh();
    let request = derived_request();
    assert_eq!(write(&mut bench, &request), MSG_OK);

    let reply = read(&mut bench);
    assert_eq!(reply.control, ControlMode::Delta);
    assert_eq!(reply.deadzone, 10);
    assert_eq!(reply.ch1, request.ch1);
    assert_eq!(reply.ch2, request.ch2);

    let rebooted = Bench::boot(bench.store.clone());
    let live = rebooted.regs.config();
    assert_eq!(live.left, PlaneMixer::new(0, -65, -65));
    assert_eq!(live.right, PlaneMixer::new(0, -65, 65));
    assert_eq!(rebooted.store.writes(), bench.store.writes());
}

#[test]
fn written_coefficients_drive_the_motors() {
    let mut bench = Bench::fresh();
    assert_eq!(write(&mut bench, &derived_request()), MSG_OK);
    bench.bring_up();

    for _ in 0..4 {
        bench.frame(250, 125);
    }
    assert_eq!(bench.command(MotorId::Left), MotorCommand::forward(253));
    assert_eq!(bench.command(MotorId::Right), MotorCommand::forward(253));
}

#[test]
fn failed_store_keeps_previous_record() {
    let mut store = MemoryStore::with_record(&ConfigurationRecord::DEFAULT);
    store.fail_writes(true);
    let mut bench = Bench::boot(store);

    assert_eq!(write(&mut bench, &derived_request()), MSG_NOK);
    assert_eq!(bench.regs.config(), ConfigurationRecord::DEFAULT);
    assert_eq!(read(&mut bench).control, ControlMode::Tank);
}

#[test]
fn stalled_host_leaves_device_in_config() {
    let mut bench = Bench::fresh();
    let mut buf = [0u8; MAX_WRITE_LEN];
    let n = derived_request().encode(&mut buf);
    bench.transport.inject(&buf[..n - 4]);

    assert_eq!(bench.step(), OperatingState::Config);
    assert_eq!(bench.step(), OperatingState::Config);
    bench.advance_ms(TRANSACTION_TIMEOUT_MS);
    assert_eq!(bench.step(), OperatingState::Config);
    assert!(bench.transport.take_sent().is_empty());

    // The host retries from scratch; completing it is the only way out.
    bench.transport.inject(&[REQUEST_READ]);
    assert_eq!(bench.step(), OperatingState::Init);
    assert_eq!(bench.transport.take_sent().len(), READ_REPLY_LEN);
}

#[test]
fn bytes_after_signal_are_not_config() {
    let mut bench = Bench::fresh();
    bench.bring_up();
    bench.transport.inject(&[REQUEST_READ]);
    assert_eq!(bench.step(), OperatingState::Active);
    assert!(bench.transport.take_sent().is_empty());
}
