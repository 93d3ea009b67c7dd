//! Three-joint leg kinematics: forward map, Jacobian, and hip layout.
//!
//! Body frame convention: x forward, y left, z up. A leg's joint vector is
//! (abduction, hip, knee); abduction rolls the leg plane about x, hip and
//! knee pitch the two links inside that plane. With all joints at zero the
//! leg points straight down from the hip.

use nalgebra::{Matrix3, Vector3};

use crate::types::NUM_LEGS;

/// Link geometry shared by all four legs.
#[derive(Debug, Clone, Copy)]
pub struct LegGeometry {
    /// Lateral offset from the abduction axis to the leg plane (m).
    pub abduction_offset: f32,
    /// Upper link length (m).
    pub upper: f32,
    /// Lower link length (m).
    pub lower: f32,
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            abduction_offset: 0.04,
            upper: 0.08,
            lower: 0.11,
        }
    }
}

/// Hip mount positions in the body frame.
#[derive(Debug, Clone, Copy)]
pub struct HipLayout {
    /// Fore/aft distance between front and rear hip axes (m).
    pub length: f32,
    /// Lateral distance between left and right hip axes (m).
    pub width: f32,
}

impl Default for HipLayout {
    fn default() -> Self {
        Self {
            length: 0.276,
            width: 0.1,
        }
    }
}

/// Lateral sign of a leg: right legs (even index) −1, left legs +1.
/// Legs are ordered front-right, front-left, rear-right, rear-left.
#[inline]
pub fn leg_side_sign(leg: usize) -> f32 {
    if leg % 2 == 0 { -1.0 } else { 1.0 }
}

/// Hip mount position of `leg` in the body frame.
pub fn hip_position(layout: &HipLayout, leg: usize) -> Vector3<f32> {
    debug_assert!(leg < NUM_LEGS);
    let x = if leg < 2 {
        layout.length / 2.0
    } else {
        -layout.length / 2.0
    };
    let y = leg_side_sign(leg) * layout.width / 2.0;
    Vector3::new(x, y, 0.0)
}

/// Leg-tip position relative to the hip for joint angles `q`.
pub fn forward_kinematics(q: Vector3<f32>, geometry: &LegGeometry, leg: usize) -> Vector3<f32> {
    let d = leg_side_sign(leg) * geometry.abduction_offset;
    let (s0, c0) = q.x.sin_cos();
    let (s1, c1) = q.y.sin_cos();
    let (s12, c12) = (q.y + q.z).sin_cos();

    // In-plane coordinates before the abduction roll.
    let x = -(geometry.upper * s1 + geometry.lower * s12);
    let plane_z = -(geometry.upper * c1 + geometry.lower * c12);

    Vector3::new(x, d * c0 - plane_z * s0, d * s0 + plane_z * c0)
}

/// Jacobian relating joint angular velocity to tip linear velocity at `q`.
/// Its transpose maps a tip force to joint torques.
pub fn leg_jacobian(q: Vector3<f32>, geometry: &LegGeometry, leg: usize) -> Matrix3<f32> {
    let d = leg_side_sign(leg) * geometry.abduction_offset;
    let u = geometry.upper;
    let l = geometry.lower;
    let (s0, c0) = q.x.sin_cos();
    let (s1, c1) = q.y.sin_cos();
    let (s12, c12) = (q.y + q.z).sin_cos();

    // Reach terms of the in-plane chain and their derivative.
    let r = u * c1 + l * c12;
    let rp = u * s1 + l * s12;

    Matrix3::new(
        0.0,
        -r,
        -l * c12,
        -d * s0 + r * c0,
        -rp * s0,
        -l * s12 * s0,
        d * c0 + r * s0,
        rp * c0,
        l * s12 * c0,
    )
}
