#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Control core for a quadruped's leg actuation (hardware-agnostic).
//!
//! Turns high-level motion commands — joint positions, leg-tip cartesian
//! positions/velocities, raw currents — into per-actuator current commands
//! for 12 actuators (4 legs × 3 joints), while enforcing limits and running
//! the one-time homing calibration. All hardware interactions go through the
//! `drive_traits::ActuatorBus` and `drive_traits::Imu` traits; time comes
//! from `drive_traits::clock::Clock`.
//!
//! ## Architecture
//!
//! - **Transform**: raw↔physical unit conversion (`transform` module)
//! - **Kinematics**: forward map and Jacobian for a 3-joint leg (`kinematics`)
//! - **Control**: joint and cartesian PD laws, soft limit, saturation
//!   (`control`)
//! - **Safety**: fault scanning and current clamping (`safety`)
//! - **Homing**: calibration parameters and the smoothed hand-off (`homing`)
//! - **Drive**: the control-mode state machine, command surface, and grouped
//!   bus dispatch (`drive`)
//!
//! The tick path is single-threaded and allocation-free; commands are
//! fixed-size 12-wide arrays on the stack.

pub mod config;
pub mod control;
pub mod conversions;
pub mod drive;
pub mod error;
pub mod homing;
pub mod hw_error;
pub mod kinematics;
pub mod mocks;
pub mod safety;
pub mod transform;
pub mod types;
pub mod util;

pub use config::DriveParams;
pub use control::{CartesianGains, JointGains};
pub use drive::{ControlMode, Drive, DriveBuilder};
pub use error::{BuildError, DriveError, Result};
pub use homing::HomingParams;
pub use kinematics::{HipLayout, LegGeometry};
pub use safety::FaultLimits;
pub use transform::FrameTransform;
pub use types::{ActuatorMask, ActuatorVector, Joint, NUM_ACTUATORS, NUM_LEGS};
