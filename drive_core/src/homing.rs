//! Homing parameters and the smoothed hand-off into position control.
//!
//! Homing assumes every joint has been driven against its mechanical stop
//! before the sequence starts, so the raw positions at that instant are a
//! known reference. The hand-off session interpolates from the measured
//! posture to the stance target with cosine easing, which has zero velocity
//! at both ends and therefore no torque step.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

use crate::types::{ActuatorVector, JOINTS_PER_LEG};

/// Backlash allowance folded into the stop and stance angles (rad).
const BACKLASH: f32 = 2.0 / 80.0;

/// Static homing configuration. The per-joint angles repeat across the four
/// legs; the direction signs do not, since mirrored legs approach their
/// stops from opposite sides.
#[derive(Debug, Clone)]
pub struct HomingParams {
    /// Known joint angle at each mechanical stop, before polarity correction.
    pub zero_targets: ActuatorVector,
    /// Stance angles commanded after a successful homing pass.
    pub stance_targets: ActuatorVector,
    /// Per-actuator approach direction toward the stop (+1/−1).
    pub directions: ActuatorVector,
    /// Largest accepted |raw position| when the sequence starts (rad).
    pub start_tolerance: f32,
    /// Current limit applied for the homing pass (A).
    pub current_limit: f32,
    /// Length of the smoothing hand-off into position control.
    pub transition: Duration,
}

/// Repeat one leg's (abduction, hip, knee) triple across all twelve slots.
fn per_leg(triple: [f32; JOINTS_PER_LEG]) -> ActuatorVector {
    core::array::from_fn(|i| triple[i % JOINTS_PER_LEG])
}

impl Default for HomingParams {
    fn default() -> Self {
        let zero_triple = [
            BACKLASH,
            (90.0 - 30.0) * PI / 180.0 + BACKLASH,
            (180.0 - 30.0) * PI / 180.0 + BACKLASH,
        ];
        let stance_triple = [
            45.0 * PI / 180.0 + BACKLASH,
            90.0 * PI / 180.0 + BACKLASH,
            (180.0 - 15.0) * PI / 180.0 + BACKLASH,
        ];
        Self {
            zero_targets: per_leg(zero_triple),
            stance_targets: per_leg(stance_triple),
            directions: [
                -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0,
            ],
            start_tolerance: 0.15,
            current_limit: 2.0,
            transition: Duration::from_secs(5),
        }
    }
}

/// Session state for the smoothing hand-off. Exists only while the drive is
/// interpolating from the homed posture toward the stance target; cleared
/// once the interpolation completes.
#[derive(Debug, Clone)]
pub struct Transition {
    started: Instant,
    duration: Duration,
    start: ActuatorVector,
    target: ActuatorVector,
}

impl Transition {
    pub fn begin(
        now: Instant,
        duration: Duration,
        start: ActuatorVector,
        target: ActuatorVector,
    ) -> Self {
        Self {
            started: now,
            duration,
            start,
            target,
        }
    }

    /// Stance target captured when the hand-off began.
    pub fn target(&self) -> &ActuatorVector {
        &self.target
    }

    /// Interpolated reference at `now`, plus whether the hand-off is done.
    pub fn reference_at(&self, now: Instant) -> (ActuatorVector, bool) {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(self.started).as_secs_f32()
                / self.duration.as_secs_f32())
            .clamp(0.0, 1.0)
        };
        let smooth = 0.5 - 0.5 * (progress * PI).cos();
        let reference: ActuatorVector = core::array::from_fn(|i| {
            self.start[i] + (self.target[i] - self.start[i]) * smooth
        });
        (reference, progress >= 1.0)
    }
}
