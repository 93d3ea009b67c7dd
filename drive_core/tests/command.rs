//! Current command clamping, masking, fixed-point dispatch, and the
//! clamp-before-fault-check ordering.

use drive_core::mocks::{MockBus, MockImu};
use drive_core::{ControlMode, Drive, DriveError, DriveParams};
use drive_traits::BusGroup;

struct Rig {
    drive: Drive<MockBus, MockImu>,
    front: MockBus,
    rear: MockBus,
}

fn rig() -> Rig {
    let front = MockBus::new();
    let rear = MockBus::new();
    let drive = Drive::builder()
        .with_front_bus(front.clone())
        .with_rear_bus(rear.clone())
        .with_imu(MockImu::default())
        .with_params(DriveParams::default())
        .build()
        .expect("drive build");
    Rig { drive, front, rear }
}

#[test]
fn oversized_request_clamps_without_faulting() {
    let mut r = rig();
    r.drive.set_activations([true; 12]);
    r.drive.set_max_current(2.0);
    r.drive.set_current(0, 5.0);
    assert_eq!(r.drive.tick().expect("tick"), ControlMode::CurrentControl);
    assert_eq!(r.drive.last_commanded_current()[0], 2.0);

    // Actuator 0 rides slot 0 of the front low frame, polarity −1.
    let frames = r.front.take_frames();
    let (low, group) = frames[0];
    assert_eq!(group, BusGroup::LowFour);
    assert_eq!(low[0], -2000);
}

#[test]
fn ceiling_below_fault_limit_makes_current_faults_unreachable() {
    // The fault check runs on the already-clamped command, so with the
    // default ceiling (≤ fault limit) even an absurd request cannot trip it.
    let mut r = rig();
    r.drive.set_activations([true; 12]);
    r.drive.set_max_current(2.0);
    r.drive.set_current(7, 1000.0);
    for _ in 0..3 {
        assert_eq!(r.drive.tick().expect("tick"), ControlMode::CurrentControl);
    }
    assert_eq!(r.drive.last_commanded_current()[7], 2.0);
}

#[test]
fn raising_the_ceiling_past_the_fault_limit_arms_the_current_fault() {
    let mut r = rig();
    r.drive.set_activations([true; 12]);
    r.drive.set_max_current(20.0);
    r.drive.set_current(0, 15.0);
    assert_eq!(r.drive.tick().expect("tick"), ControlMode::Error);
    match r.drive.last_fault() {
        Some(DriveError::CurrentFault { actuator: 0, .. }) => {}
        other => panic!("expected current fault on actuator 0, got {other:?}"),
    }
    // The faulting command was discarded: nothing was written this tick.
    assert!(r.front.take_frames().is_empty());
    assert!(r.rear.take_frames().is_empty());
    assert_eq!(*r.drive.last_commanded_current(), [0.0; 12]);
}

#[test]
fn masked_actuators_always_receive_zero() {
    let mut r = rig();
    let mut mask = [true; 12];
    mask[1] = false;
    r.drive.set_activations(mask);
    r.drive.set_max_current(2.0);
    r.drive.set_current(0, 1.0);
    r.drive.set_current(1, 1.0);
    r.drive.tick().expect("tick");

    assert_eq!(r.drive.last_commanded_current()[0], 1.0);
    assert_eq!(r.drive.last_commanded_current()[1], 0.0);
    let (low, _) = r.front.take_frames()[0];
    assert_eq!(low[1], 0);
}

#[test]
fn dispatch_routes_each_bus_group_to_its_frame() {
    let mut r = rig();
    r.drive.set_activations([true; 12]);
    r.drive.set_max_current(2.0);
    // One actuator in every frame: 0 (front low), 4 (front high),
    // 8 (rear low), 11 (rear high).
    r.drive.set_current(0, 1.0);
    r.drive.set_current(4, 1.0);
    r.drive.set_current(8, 1.0);
    r.drive.set_current(11, 1.0);
    r.drive.tick().expect("tick");

    let front = r.front.take_frames();
    let rear = r.rear.take_frames();
    assert_eq!(front.len(), 2);
    assert_eq!(rear.len(), 2);

    // Polarity: actuators 0 and 11 are −1, 4 and 8 are +1.
    assert_eq!(front[0], ([-1000, 0, 0, 0], BusGroup::LowFour));
    assert_eq!(front[1], ([1000, 0, 0, 0], BusGroup::HighFour));
    assert_eq!(rear[0], ([0, 0, 1000, 0], BusGroup::LowFour));
    assert_eq!(rear[1], ([0, -1000, 0, 0], BusGroup::HighFour));
}

#[test]
fn command_converts_to_rounded_milliamps() {
    let mut r = rig();
    r.drive.set_activations([true; 12]);
    r.drive.set_max_current(2.0);
    r.drive.set_current(2, 1.2346); // polarity +1
    r.drive.tick().expect("tick");
    let (low, _) = r.front.take_frames()[0];
    assert_eq!(low[2], 1235);
}

#[test]
fn invalid_actuator_index_latches_error() {
    let mut r = rig();
    r.drive.set_current(12, 1.0);
    assert_eq!(r.drive.mode(), ControlMode::Error);
    match r.drive.last_fault() {
        Some(DriveError::InvalidActuator(12)) => {}
        other => panic!("expected invalid-actuator fault, got {other:?}"),
    }
}
