//! Bus and IMU implementations for the quadruped drive: a simulated plant
//! that is always available, and a serial CAN-bridge transport behind the
//! `hardware` feature.

pub mod error;
#[cfg(feature = "hardware")]
pub mod bridge;

use drive_traits::{ActuatorBus, ActuatorState, BusGroup, Imu, Orientation};

const SLOTS: usize = 6;

/// Torque constant of the simulated motors (N·m per A).
const TORQUE_CONSTANT: f32 = 0.18;
/// Viscous damping at the joint (N·m per rad/s).
const DAMPING: f32 = 0.02;
/// Rotor plus link inertia (kg·m²).
const INERTIA: f32 = 0.002;

/// Simulated six-controller bus: commanded currents drive a first-order
/// motor model that is integrated on every `poll`.
pub struct SimulatedBus {
    states: [ActuatorState; SLOTS],
    commanded: [f32; SLOTS],
    dt: f32,
}

impl SimulatedBus {
    /// `dt` is the integration step applied per poll, normally the tick
    /// period.
    pub fn new(dt: f32) -> Self {
        Self {
            states: [ActuatorState::default(); SLOTS],
            commanded: [0.0; SLOTS],
            dt,
        }
    }

    /// Start the controllers away from the power-on zero.
    pub fn with_positions(mut self, positions: [f32; SLOTS]) -> Self {
        for (state, p) in self.states.iter_mut().zip(positions) {
            state.position = p;
        }
        self
    }
}

impl ActuatorBus for SimulatedBus {
    fn poll(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for (state, &current) in self.states.iter_mut().zip(self.commanded.iter()) {
            let torque = TORQUE_CONSTANT * current - DAMPING * state.velocity;
            state.velocity += torque / INERTIA * self.dt;
            state.position += state.velocity * self.dt;
            state.current = current;
            state.electrical_power = (current * current * 0.3).abs();
            state.mechanical_power = (torque * state.velocity).abs();
        }
        Ok(())
    }

    fn command_torques(
        &mut self,
        milliamps: [i32; 4],
        group: BusGroup,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match group {
            BusGroup::LowFour => {
                for (slot, &ma) in milliamps.iter().enumerate() {
                    self.commanded[slot] = ma as f32 / 1000.0;
                }
            }
            BusGroup::HighFour => {
                // Only the first two slots of the high frame are populated.
                self.commanded[4] = milliamps[0] as f32 / 1000.0;
                self.commanded[5] = milliamps[1] as f32 / 1000.0;
            }
        }
        Ok(())
    }

    fn actuator(&self, slot: usize) -> ActuatorState {
        self.states.get(slot).copied().unwrap_or_default()
    }
}

/// Simulated orientation sensor: level and stationary.
#[derive(Debug, Default)]
pub struct SimulatedImu {
    orientation: Orientation,
    filter_hz: u32,
}

impl Imu for SimulatedImu {
    fn setup(&mut self, filter_hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.filter_hz = filter_hz;
        tracing::debug!(filter_hz, "simulated imu ready");
        Ok(())
    }

    fn update(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_current_spins_the_motor_forward() {
        let mut bus = SimulatedBus::new(0.004);
        bus.command_torques([2000, 0, 0, 0], BusGroup::LowFour).unwrap();
        for _ in 0..100 {
            bus.poll().unwrap();
        }
        assert!(bus.actuator(0).velocity > 0.0);
        assert!(bus.actuator(0).position > 0.0);
        assert_eq!(bus.actuator(1).position, 0.0);
    }

    #[test]
    fn high_frame_addresses_slots_four_and_five() {
        let mut bus = SimulatedBus::new(0.004);
        bus.command_torques([1500, -1500, 0, 0], BusGroup::HighFour)
            .unwrap();
        bus.poll().unwrap();
        assert!(bus.actuator(4).current > 0.0);
        assert!(bus.actuator(5).current < 0.0);
        assert_eq!(bus.actuator(0).current, 0.0);
    }

    #[test]
    fn starting_positions_survive_until_polled_with_command() {
        let bus = SimulatedBus::new(0.004).with_positions([0.1, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(bus.actuator(0).position, 0.1);
    }

    #[test]
    fn out_of_range_slot_reads_default() {
        let bus = SimulatedBus::new(0.004);
        assert_eq!(bus.actuator(9), ActuatorState::default());
    }
}
