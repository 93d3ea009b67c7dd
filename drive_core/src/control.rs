//! PD control laws, the knee soft limit, and force-preserving saturation.

use nalgebra::{Matrix3, Vector3};

/// Scalar gains for the joint-space PD law, shared across all actuators.
#[derive(Debug, Clone, Copy, Default)]
pub struct JointGains {
    pub kp: f32,
    pub kd: f32,
}

/// Matrix gains for the cartesian-space PD law, applied per leg.
#[derive(Debug, Clone)]
pub struct CartesianGains {
    pub kp: Matrix3<f32>,
    pub kd: Matrix3<f32>,
}

impl Default for CartesianGains {
    fn default() -> Self {
        Self {
            kp: Matrix3::zeros(),
            kd: Matrix3::zeros(),
        }
    }
}

/// Joint-space PD law: current from position and velocity error.
#[inline]
pub fn joint_pd(gains: JointGains, position: f32, velocity: f32, pos_ref: f32, vel_ref: f32) -> f32 {
    gains.kp * (pos_ref - position) + gains.kd * (vel_ref - velocity)
}

/// Cartesian-space PD law: tip force from tip position and velocity error.
pub fn cartesian_pd(
    gains: &CartesianGains,
    position: &Vector3<f32>,
    velocity: &Vector3<f32>,
    pos_ref: &Vector3<f32>,
    vel_ref: &Vector3<f32>,
) -> Vector3<f32> {
    gains.kp * (pos_ref - position) + gains.kd * (vel_ref - velocity)
}

/// Corrective torque once the knee passes `soft_limit` toward full flexion;
/// zero while the joint is inside its range.
#[inline]
pub fn knee_limit_torque(kp: f32, soft_limit: f32, knee_angle: f32) -> f32 {
    if knee_angle > soft_limit {
        kp * (soft_limit - knee_angle)
    } else {
        0.0
    }
}

/// Largest absolute component of `v`.
#[inline]
pub fn infinity_norm(v: &Vector3<f32>) -> f32 {
    v.x.abs().max(v.y.abs()).max(v.z.abs())
}

/// Scale a leg's joint torques so the largest magnitude fits `max`. Uniform
/// scaling keeps the ratios between the three joints, so the commanded force
/// direction survives saturation.
pub fn saturate(torques: Vector3<f32>, max: f32) -> Vector3<f32> {
    let norm = infinity_norm(&torques);
    if norm > max {
        torques * (max / norm)
    } else {
        torques
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn joint_pd_is_zero_at_reference() {
        let gains = JointGains { kp: 10.0, kd: 1.0 };
        assert_eq!(joint_pd(gains, 0.5, -0.2, 0.5, -0.2), 0.0);
    }

    #[test]
    fn joint_pd_pushes_toward_reference() {
        let gains = JointGains { kp: 10.0, kd: 0.0 };
        assert!(joint_pd(gains, 0.0, 0.0, 1.0, 0.0) > 0.0);
        assert!(joint_pd(gains, 2.0, 0.0, 1.0, 0.0) < 0.0);
    }

    #[test]
    fn cartesian_pd_combines_both_error_terms() {
        let gains = CartesianGains {
            kp: Matrix3::identity() * 2.0,
            kd: Matrix3::identity() * 0.5,
        };
        let force = cartesian_pd(
            &gains,
            &Vector3::new(0.0, 0.0, -0.1),
            &Vector3::zeros(),
            &Vector3::new(0.0, 0.0, -0.2),
            &Vector3::new(0.0, 0.0, 0.4),
        );
        assert_relative_eq!(force.z, 2.0 * (-0.1) + 0.5 * 0.4);
    }

    #[test]
    fn knee_torque_is_zero_inside_range() {
        let limit = -core::f32::consts::FRAC_PI_6;
        assert_eq!(knee_limit_torque(5.0, limit, limit - 0.2), 0.0);
    }

    #[test]
    fn knee_torque_pushes_back_past_limit() {
        let limit = -core::f32::consts::FRAC_PI_6;
        let torque = knee_limit_torque(5.0, limit, limit + 0.1);
        assert_relative_eq!(torque, -0.5, epsilon = 1e-6);
    }

    #[test]
    fn saturation_leaves_small_torques_alone() {
        let t = Vector3::new(0.5, -0.3, 0.1);
        assert_eq!(saturate(t, 2.0), t);
    }

    #[test]
    fn saturation_at_zero_limit_zeroes_output() {
        let t = saturate(Vector3::new(1.0, -2.0, 0.5), 0.0);
        assert_eq!(t, Vector3::zeros());
    }

    proptest! {
        #[test]
        fn saturation_preserves_direction(
            t0 in -50.0f32..50.0,
            t1 in -50.0f32..50.0,
            t2 in -50.0f32..50.0,
            max in 0.1f32..10.0,
        ) {
            let raw = Vector3::new(t0, t1, t2);
            let norm = infinity_norm(&raw);
            prop_assume!(norm > max);
            let out = saturate(raw, max);
            let scale = max / norm;
            prop_assert!((out.x - t0 * scale).abs() <= 1e-4);
            prop_assert!((out.y - t1 * scale).abs() <= 1e-4);
            prop_assert!((out.z - t2 * scale).abs() <= 1e-4);
            prop_assert!(infinity_norm(&out) <= max * (1.0 + 1e-5));
        }
    }
}
