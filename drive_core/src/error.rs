use thiserror::Error;

use crate::types::NUM_ACTUATORS;

/// Fault and transport errors raised by the drive.
///
/// Limit faults (`PositionFault`, `VelocityFault`, `CurrentFault`) and the
/// homing preconditions never abort a tick: they latch the Error control mode
/// and the tick still completes with a zero command. Only transport failures
/// propagate as `Err` from `Drive::tick`.
#[derive(Debug, Error, Clone)]
pub enum DriveError {
    #[error("actuator {actuator} position {position:.3} rad exceeds fault limit {limit:.3}")]
    PositionFault {
        actuator: usize,
        position: f32,
        limit: f32,
    },
    #[error("actuator {actuator} velocity {velocity:.3} rad/s exceeds fault limit {limit:.3}")]
    VelocityFault {
        actuator: usize,
        velocity: f32,
        limit: f32,
    },
    #[error("commanded current {current:.3} A on actuator {actuator} exceeds fault limit {limit:.3}")]
    CurrentFault {
        actuator: usize,
        current: f32,
        limit: f32,
    },
    #[error(
        "homing started away from the mechanical stop: actuator {actuator} at {position:.3} rad"
    )]
    HomingStart { actuator: usize, position: f32 },
    #[error("actuator index {0} out of range (0..{NUM_ACTUATORS})")]
    InvalidActuator(usize),
    #[error("bus error: {0}")]
    Bus(String),
    #[error("bus timeout")]
    Timeout,
}

/// Errors raised while assembling a `Drive`.
#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing front bus")]
    MissingFrontBus,
    #[error("missing rear bus")]
    MissingRearBus,
    #[error("missing imu")]
    MissingImu,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
