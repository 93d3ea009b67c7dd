//! Per-tick fault scanning and current clamping.

use crate::error::DriveError;
use crate::types::{ActuatorMask, ActuatorVector, NUM_ACTUATORS};

/// Physical limits that latch the Error mode when exceeded.
#[derive(Debug, Clone, Copy)]
pub struct FaultLimits {
    /// Largest allowed |position| in radians.
    pub position: f32,
    /// Largest allowed |velocity| in radians per second.
    pub velocity: f32,
    /// Largest allowed |commanded current| in amps, checked after clamping.
    pub current: f32,
}

impl Default for FaultLimits {
    fn default() -> Self {
        Self {
            position: core::f32::consts::PI,
            velocity: 7.0,
            current: 10.0,
        }
    }
}

/// First limit violation across all actuators, if any. A value exactly at a
/// limit passes; only strictly greater magnitudes fault.
pub fn scan(
    positions: &ActuatorVector,
    velocities: &ActuatorVector,
    limits: &FaultLimits,
) -> Option<DriveError> {
    for i in 0..NUM_ACTUATORS {
        if positions[i].abs() > limits.position {
            return Some(DriveError::PositionFault {
                actuator: i,
                position: positions[i],
                limit: limits.position,
            });
        }
        if velocities[i].abs() > limits.velocity {
            return Some(DriveError::VelocityFault {
                actuator: i,
                velocity: velocities[i],
                limit: limits.velocity,
            });
        }
    }
    None
}

/// Elementwise clamp into [−max, max]. Uses min/max rather than `clamp` so
/// a non-finite ceiling cannot panic the tick.
pub fn clamp_currents(requested: &ActuatorVector, max: f32) -> ActuatorVector {
    core::array::from_fn(|i| requested[i].max(-max).min(max))
}

/// First clamped entry whose magnitude still exceeds the fault limit.
pub fn current_fault(command: &ActuatorVector, limit: f32) -> Option<DriveError> {
    (0..NUM_ACTUATORS)
        .find(|&i| command[i].abs() > limit)
        .map(|i| DriveError::CurrentFault {
            actuator: i,
            current: command[i],
            limit,
        })
}

/// Zero every entry whose mask bit is clear.
pub fn apply_mask(command: &mut ActuatorVector, mask: &ActuatorMask) {
    for (value, &active) in command.iter_mut().zip(mask.iter()) {
        if !active {
            *value = 0.0;
        }
    }
}
