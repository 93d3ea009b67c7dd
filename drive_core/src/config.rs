//! Runtime parameters for the drive.
//!
//! These are the in-memory structs the state machine runs on. They are
//! separate from the TOML-deserialized schema in `drive_config`; the
//! `conversions` module bridges the two.

use crate::control::{CartesianGains, JointGains};
use crate::homing::HomingParams;
use crate::kinematics::{HipLayout, LegGeometry};
use crate::safety::FaultLimits;
use crate::types::ActuatorVector;

/// Construction-time parameters. Direction multipliers and homing directions
/// are fixed once the drive is built; gains and limits have runtime setters.
#[derive(Debug, Clone)]
pub struct DriveParams {
    /// Per-actuator polarity between hardware and the logical joint frame.
    pub directions: ActuatorVector,
    pub fault_limits: FaultLimits,
    /// Command ceiling in amps. Starts at zero so nothing moves until an
    /// operator raises it (homing raises it to its own limit).
    pub max_current: f32,
    pub joint_gains: JointGains,
    pub cartesian_gains: CartesianGains,
    pub homing: HomingParams,
    pub geometry: LegGeometry,
    pub layout: HipLayout,
    /// Knee angle past which the corrective soft-limit torque engages (rad).
    pub knee_soft_limit: f32,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            directions: [
                -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0,
            ],
            fault_limits: FaultLimits::default(),
            max_current: 0.0,
            joint_gains: JointGains::default(),
            cartesian_gains: CartesianGains::default(),
            homing: HomingParams::default(),
            geometry: LegGeometry::default(),
            layout: HipLayout::default(),
            knee_soft_limit: -core::f32::consts::FRAC_PI_6,
        }
    }
}
