//! Per-actuator raw↔physical unit conversion.

use crate::types::{ActuatorVector, NUM_ACTUATORS, ZERO_VECTOR};

/// Maps each actuator's raw controller frame onto the logical joint frame
/// through a calibrated zero offset and a fixed polarity sign.
///
/// Zero offsets start at 0.0, so physical positions read before any zeroing
/// (manual or homing) are relative to the raw power-on zero.
#[derive(Debug, Clone)]
pub struct FrameTransform {
    zero_position: ActuatorVector,
    direction: ActuatorVector,
}

impl FrameTransform {
    /// `direction` holds the per-actuator polarity signs (+1/−1), fixed for
    /// the life of the transform.
    pub fn new(direction: ActuatorVector) -> Self {
        Self {
            zero_position: ZERO_VECTOR,
            direction,
        }
    }

    #[inline]
    pub fn direction(&self, i: usize) -> f32 {
        self.direction[i]
    }

    #[inline]
    pub fn zero_position(&self, i: usize) -> f32 {
        self.zero_position[i]
    }

    /// Define the calibrated zero for every actuator at once.
    pub fn set_zero_positions(&mut self, zero: ActuatorVector) {
        self.zero_position = zero;
    }

    /// Define the calibrated zero for one actuator.
    pub fn set_zero_position(&mut self, i: usize, zero: f32) {
        self.zero_position[i] = zero;
    }

    /// Physical joint angle from a raw controller position.
    #[inline]
    pub fn position(&self, i: usize, raw: f32) -> f32 {
        (raw - self.zero_position[i]) * self.direction[i]
    }

    /// Physical joint velocity from a raw controller velocity.
    #[inline]
    pub fn velocity(&self, i: usize, raw: f32) -> f32 {
        raw * self.direction[i]
    }

    /// Physical current from a raw controller current.
    #[inline]
    pub fn current(&self, i: usize, raw: f32) -> f32 {
        raw * self.direction[i]
    }

    /// Hardware-polarity current for a physical current command.
    #[inline]
    pub fn to_raw_current(&self, i: usize, current: f32) -> f32 {
        current * self.direction[i]
    }

    /// True when every slot carries a ±1 sign.
    pub fn directions_valid(&self) -> bool {
        (0..NUM_ACTUATORS).all(|i| self.direction[i] == 1.0 || self.direction[i] == -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(sign: f32) -> ActuatorVector {
        [sign; NUM_ACTUATORS]
    }

    #[test]
    fn position_subtracts_zero_then_applies_sign() {
        let mut t = FrameTransform::new(uniform(-1.0));
        t.set_zero_position(3, 0.2);
        assert_eq!(t.position(3, 1.0), -0.8);
    }

    #[test]
    fn velocity_and_current_only_apply_sign() {
        let t = FrameTransform::new(uniform(-1.0));
        assert_eq!(t.velocity(0, 2.5), -2.5);
        assert_eq!(t.current(11, -1.5), 1.5);
    }

    #[test]
    fn zeroing_at_current_raw_reads_zero() {
        let mut t = FrameTransform::new(uniform(1.0));
        let raw: ActuatorVector = core::array::from_fn(|i| i as f32 * 0.1);
        t.set_zero_positions(raw);
        for i in 0..NUM_ACTUATORS {
            assert_eq!(t.position(i, raw[i]), 0.0);
        }
    }

    #[test]
    fn round_trips_command_polarity() {
        let t = FrameTransform::new(uniform(-1.0));
        let commanded = 1.25;
        assert_eq!(t.current(0, t.to_raw_current(0, commanded)), commanded);
    }
}
