pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Cached state of one motor controller on a bus, in the controller's raw
/// frame (no zero offset or polarity correction applied).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActuatorState {
    /// Shaft position in radians, relative to the power-on zero.
    pub position: f32,
    /// Shaft velocity in radians per second.
    pub velocity: f32,
    /// Measured phase current in amps.
    pub current: f32,
    /// Electrical power drawn by the controller in watts.
    pub electrical_power: f32,
    /// Mechanical output power in watts.
    pub mechanical_power: f32,
}

/// Addressing group for a torque command frame. The transport fits at most
/// four controller setpoints per frame, so each bus of six controllers takes
/// one full frame plus one half-empty frame per command cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusGroup {
    /// Controller IDs 0–3 on this bus.
    LowFour,
    /// Controller IDs 4–7 on this bus.
    HighFour,
}

/// One physical actuator bus serving up to six motor controllers.
pub trait ActuatorBus {
    /// Ingest pending inbound frames and refresh the cached actuator state.
    fn poll(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Write one torque command frame, in signed milliamps, to `group`.
    fn command_torques(
        &mut self,
        milliamps: [i32; 4],
        group: BusGroup,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Cached state for controller `slot` (0..6) on this bus. Out-of-range
    /// slots return a default (all-zero) state.
    fn actuator(&self, slot: usize) -> ActuatorState;
}

/// Body orientation and angular rates from the inertial sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub yaw_rate: f32,
    pub pitch_rate: f32,
    pub roll_rate: f32,
}

/// Orientation sensor. Consumed for telemetry only, never for control.
pub trait Imu {
    /// One-time sensor setup with the given filter frequency in Hz.
    fn setup(&mut self, filter_hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Read the sensor and refresh the cached orientation.
    fn update(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Most recently cached orientation.
    fn orientation(&self) -> Orientation;
}
