//! Homing sequence and the smoothed hand-off into position control.

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use drive_core::mocks::{MockBus, MockImu};
use drive_core::types::{Joint, joint_indices};
use drive_core::{ControlMode, Drive, DriveParams, JointGains};
use drive_traits::clock::ManualClock;

struct Rig {
    drive: Drive<MockBus, MockImu>,
    front: MockBus,
    #[allow(dead_code)]
    rear: MockBus,
    clock: ManualClock,
}

fn rig(params: DriveParams) -> Rig {
    let front = MockBus::new();
    let rear = MockBus::new();
    let clock = ManualClock::new();
    let drive = Drive::builder()
        .with_front_bus(front.clone())
        .with_rear_bus(rear.clone())
        .with_imu(MockImu::default())
        .with_clock(Arc::new(clock.clone()))
        .with_params(params)
        .build()
        .expect("drive build");
    Rig {
        drive,
        front,
        rear,
        clock,
    }
}

fn unit_gain_params() -> DriveParams {
    DriveParams {
        joint_gains: JointGains { kp: 1.0, kd: 0.0 },
        ..DriveParams::default()
    }
}

#[test]
fn homing_from_the_stops_hands_off_within_the_same_tick() {
    let mut r = rig(unit_gain_params());
    r.drive.execute_homing();
    assert_eq!(r.drive.mode(), ControlMode::Homing);
    assert_eq!(r.drive.max_current(), 2.0);
    assert!(r.drive.active_mask().iter().all(|&a| a));

    let mode = r.drive.tick().expect("tick");
    assert_eq!(mode, ControlMode::PositionControl);
    assert!((0..12).all(|i| r.drive.homed(i)));
    assert!(r.drive.in_transition());
    for &p in r.drive.position_reference() {
        assert!((-PI..=PI).contains(&p));
    }
    // The position handler ran in the homing tick: both frames of the front
    // bus were written.
    let frames = r.front.take_frames();
    assert_eq!(frames.len(), 2);
}

#[test]
fn homing_aborts_when_a_joint_is_off_its_stop() {
    let mut r = rig(unit_gain_params());
    r.front.set_position(4, 0.5); // actuator 4
    r.drive.execute_homing();

    let mode = r.drive.tick().expect("tick");
    assert_eq!(mode, ControlMode::Error);
    assert!((0..12).all(|i| !r.drive.homed(i)));
    match r.drive.last_fault() {
        Some(drive_core::DriveError::HomingStart { actuator: 4, .. }) => {}
        other => panic!("expected homing-start fault on actuator 4, got {other:?}"),
    }
}

#[test]
fn start_position_exactly_at_tolerance_is_accepted() {
    let mut r = rig(unit_gain_params());
    r.front.set_position(0, 0.15);
    r.drive.execute_homing();
    assert_eq!(r.drive.tick().expect("tick"), ControlMode::PositionControl);
}

#[test]
fn hand_off_eases_from_start_to_target_over_five_seconds() {
    let mut r = rig(unit_gain_params());
    r.drive.execute_homing();
    r.drive.tick().expect("homing tick");

    // Physical start/target for actuator 0: the homed posture reads the stop
    // angle through the homing direction; the target is the stance angle.
    let params = DriveParams::default();
    let start = params.homing.zero_targets[0] * params.homing.directions[0];
    let target = params.homing.stance_targets[0] * params.homing.directions[0];

    // Halfway through, the cosine easing is exactly at the midpoint. With
    // kp = 1 and a static plant the commanded current equals ref − start.
    r.clock.advance(Duration::from_millis(2500));
    r.drive.tick().expect("mid tick");
    let mid = r.drive.last_commanded_current()[0];
    assert_relative_eq!(mid, (target - start) / 2.0, epsilon = 1e-4);
    assert!(r.drive.in_transition());

    // At the full duration the reference pins to the target and the session
    // state is cleared.
    r.clock.advance(Duration::from_millis(2500));
    r.drive.tick().expect("final tick");
    let done = r.drive.last_commanded_current()[0];
    assert_relative_eq!(done, target - start, epsilon = 1e-4);
    assert!(!r.drive.in_transition());
}

#[test]
fn new_joint_command_does_not_retrigger_the_hand_off() {
    let mut r = rig(unit_gain_params());
    r.drive.execute_homing();
    r.drive.tick().expect("homing tick");

    // Issue a new reference mid-transition: the live session keeps driving
    // toward the target it captured.
    r.clock.advance(Duration::from_millis(2500));
    r.drive.set_joint_positions([0.0; 12]);
    assert!(r.drive.in_transition());
    r.drive.tick().expect("mid tick");

    let params = DriveParams::default();
    let start = params.homing.zero_targets[0] * params.homing.directions[0];
    let target = params.homing.stance_targets[0] * params.homing.directions[0];
    assert_relative_eq!(
        r.drive.last_commanded_current()[0],
        (target - start) / 2.0,
        epsilon = 1e-4
    );

    // Once the session completes, the externally set reference takes over.
    r.clock.advance(Duration::from_millis(2500));
    r.drive.tick().expect("completion tick");
    assert!(!r.drive.in_transition());
    r.drive.tick().expect("steady tick");
    assert_relative_eq!(r.drive.last_commanded_current()[0], -start, epsilon = 1e-4);
}

#[test]
fn homed_flags_are_queryable_per_joint_group() {
    let mut r = rig(unit_gain_params());
    let knees = joint_indices(Joint::Knee);
    assert!(!r.drive.all_homed(&knees));
    r.drive.execute_homing();
    r.drive.tick().expect("tick");
    assert!(r.drive.all_homed(&knees));
    assert!(r.drive.all_homed(&joint_indices(Joint::Hip)));
}

#[test]
fn homing_is_not_accepted_while_faulted() {
    let mut r = rig(unit_gain_params());
    r.front.set_position(0, 4.0); // beyond the position fault limit
    r.drive.tick().expect("tick");
    assert_eq!(r.drive.mode(), ControlMode::Error);
    r.drive.execute_homing();
    assert_eq!(r.drive.mode(), ControlMode::Error);
}
