//! `From` implementations bridging `drive_config` types to `drive_core` types.
//!
//! These keep the TOML schema and the runtime parameter structs decoupled
//! without field-by-field mapping at every call site.

use std::time::Duration;

use nalgebra::{Matrix3, Vector3};

use crate::config::DriveParams;
use crate::control::{CartesianGains, JointGains};
use crate::homing::HomingParams;
use crate::kinematics::{HipLayout, LegGeometry};
use crate::safety::FaultLimits;
use crate::types::NUM_ACTUATORS;

// ── Gains ────────────────────────────────────────────────────────────────────

impl From<&drive_config::Gains> for JointGains {
    fn from(c: &drive_config::Gains) -> Self {
        Self { kp: c.kp, kd: c.kd }
    }
}

impl From<&drive_config::Gains> for CartesianGains {
    fn from(c: &drive_config::Gains) -> Self {
        Self {
            kp: Matrix3::from_diagonal(&Vector3::from(c.cartesian_kp)),
            kd: Matrix3::from_diagonal(&Vector3::from(c.cartesian_kd)),
        }
    }
}

// ── Safety ───────────────────────────────────────────────────────────────────

impl From<&drive_config::Safety> for FaultLimits {
    fn from(c: &drive_config::Safety) -> Self {
        Self {
            position: c.fault_position,
            velocity: c.fault_velocity,
            current: c.fault_current,
        }
    }
}

// ── Geometry ─────────────────────────────────────────────────────────────────

impl From<&drive_config::Geometry> for LegGeometry {
    fn from(c: &drive_config::Geometry) -> Self {
        Self {
            abduction_offset: c.abduction_offset,
            upper: c.upper,
            lower: c.lower,
        }
    }
}

impl From<&drive_config::Geometry> for HipLayout {
    fn from(c: &drive_config::Geometry) -> Self {
        Self {
            length: c.body_length,
            width: c.body_width,
        }
    }
}

// ── Aggregate ────────────────────────────────────────────────────────────────

fn signs_from(overrides: &Option<Vec<f32>>, defaults: [f32; NUM_ACTUATORS]) -> [f32; NUM_ACTUATORS] {
    match overrides {
        Some(v) if v.len() == NUM_ACTUATORS => core::array::from_fn(|i| v[i]),
        _ => defaults,
    }
}

impl From<&drive_config::Config> for DriveParams {
    fn from(cfg: &drive_config::Config) -> Self {
        let defaults = DriveParams::default();
        let homing = HomingParams {
            directions: signs_from(
                &cfg.actuators.homing_directions,
                defaults.homing.directions,
            ),
            start_tolerance: cfg.homing.start_tolerance,
            current_limit: cfg.homing.current_limit,
            transition: Duration::from_millis(cfg.homing.transition_ms),
            ..defaults.homing
        };
        Self {
            directions: signs_from(&cfg.actuators.directions, defaults.directions),
            fault_limits: FaultLimits::from(&cfg.safety),
            max_current: cfg.safety.max_current,
            joint_gains: JointGains::from(&cfg.gains),
            cartesian_gains: CartesianGains::from(&cfg.gains),
            homing,
            geometry: LegGeometry::from(&cfg.geometry),
            layout: HipLayout::from(&cfg.geometry),
            knee_soft_limit: defaults.knee_soft_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_map_onto_runtime_defaults() {
        let cfg = drive_config::Config::default();
        let params = DriveParams::from(&cfg);
        let defaults = DriveParams::default();
        assert_eq!(params.directions, defaults.directions);
        assert_eq!(params.homing.directions, defaults.homing.directions);
        assert_eq!(params.fault_limits.current, defaults.fault_limits.current);
        assert_eq!(params.homing.transition, defaults.homing.transition);
        assert_eq!(params.max_current, 0.0);
    }

    #[test]
    fn cartesian_gains_build_diagonal_matrices() {
        let mut cfg = drive_config::Config::default();
        cfg.gains.cartesian_kp = [1.0, 2.0, 3.0];
        let gains = CartesianGains::from(&cfg.gains);
        assert_eq!(gains.kp[(0, 0)], 1.0);
        assert_eq!(gains.kp[(1, 1)], 2.0);
        assert_eq!(gains.kp[(2, 2)], 3.0);
        assert_eq!(gains.kp[(0, 1)], 0.0);
    }

    #[test]
    fn sign_overrides_replace_defaults() {
        let mut cfg = drive_config::Config::default();
        cfg.actuators.directions = Some(vec![1.0; NUM_ACTUATORS]);
        let params = DriveParams::from(&cfg);
        assert_eq!(params.directions, [1.0; NUM_ACTUATORS]);
    }
}
