#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and validation for the quadruped drive.
//!
//! `Config` and its sub-structs are deserialized from TOML and validated
//! before the runtime parameters are built from them. Every section is
//! optional; defaults match the drive's built-in parameters.

use serde::Deserialize;

/// Number of actuators a per-actuator array must cover.
pub const NUM_ACTUATORS: usize = 12;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gains {
    /// Joint-space proportional gain (A per rad).
    pub kp: f32,
    /// Joint-space derivative gain (A per rad/s).
    pub kd: f32,
    /// Diagonal of the cartesian proportional gain matrix (N per m).
    pub cartesian_kp: [f32; 3],
    /// Diagonal of the cartesian derivative gain matrix (N per m/s).
    pub cartesian_kd: [f32; 3],
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            kp: 6.0,
            kd: 0.3,
            cartesian_kp: [800.0, 800.0, 800.0],
            cartesian_kd: [30.0, 30.0, 30.0],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Safety {
    /// Fault when |position| exceeds this (rad).
    pub fault_position: f32,
    /// Fault when |velocity| exceeds this (rad/s).
    pub fault_velocity: f32,
    /// Fault when a clamped command magnitude exceeds this (A).
    pub fault_current: f32,
    /// Command ceiling at startup (A). Zero keeps the robot limp until an
    /// operator raises it.
    pub max_current: f32,
}

impl Default for Safety {
    fn default() -> Self {
        Self {
            fault_position: core::f32::consts::PI,
            fault_velocity: 7.0,
            fault_current: 10.0,
            max_current: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Homing {
    /// Current ceiling applied for the homing pass (A).
    pub current_limit: f32,
    /// Largest accepted |raw position| at homing start (rad).
    pub start_tolerance: f32,
    /// Length of the smoothing hand-off into position control (ms).
    pub transition_ms: u64,
}

impl Default for Homing {
    fn default() -> Self {
        Self {
            current_limit: 2.0,
            start_tolerance: 0.15,
            transition_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Lateral offset from the abduction axis to the leg plane (m).
    pub abduction_offset: f32,
    /// Upper link length (m).
    pub upper: f32,
    /// Lower link length (m).
    pub lower: f32,
    /// Fore/aft distance between front and rear hip axes (m).
    pub body_length: f32,
    /// Lateral distance between left and right hip axes (m).
    pub body_width: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            abduction_offset: 0.04,
            upper: 0.08,
            lower: 0.11,
            body_length: 0.276,
            body_width: 0.1,
        }
    }
}

/// Optional per-actuator sign overrides; omit to use the built-in wiring.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Actuators {
    /// Polarity between hardware and the logical joint frame (+1/−1 each).
    pub directions: Option<Vec<f32>>,
    /// Approach direction toward each mechanical stop (+1/−1 each).
    pub homing_directions: Option<Vec<f32>>,
}

/// Telemetry field toggles and emission rate. Mirrors the drive's accessor
/// surface; the formatter consuming these lives outside the core.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Telemetry {
    pub enabled: bool,
    /// Emit one record every this many ticks.
    pub interval_ticks: u64,
    pub positions: bool,
    pub velocities: bool,
    pub currents: bool,
    pub position_references: bool,
    pub velocity_references: bool,
    pub current_references: bool,
    pub last_current: bool,
    pub orientation: bool,
    pub power: bool,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ticks: 50,
            positions: true,
            velocities: true,
            currents: true,
            position_references: true,
            velocity_references: false,
            current_references: false,
            last_current: true,
            orientation: true,
            power: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Control loop rate (Hz).
    pub tick_hz: u32,
    /// IMU filter frequency handed to `Imu::setup` (Hz).
    pub imu_filter_hz: u32,
    /// Serial port of the front bus bridge; absent selects simulation.
    pub front_port: Option<String>,
    /// Serial port of the rear bus bridge; absent selects simulation.
    pub rear_port: Option<String>,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            tick_hz: 250,
            imu_filter_hz: 50,
            front_port: None,
            rear_port: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub gains: Gains,
    pub safety: Safety,
    pub homing: Homing,
    pub geometry: Geometry,
    pub actuators: Actuators,
    pub telemetry: Telemetry,
    pub logging: Logging,
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_signs(name: &str, signs: &[f32]) -> eyre::Result<()> {
    if signs.len() != NUM_ACTUATORS {
        eyre::bail!("{name} must list exactly {NUM_ACTUATORS} entries, got {}", signs.len());
    }
    if let Some(bad) = signs.iter().find(|&&s| s != 1.0 && s != -1.0) {
        eyre::bail!("{name} entries must be +1 or -1, got {bad}");
    }
    Ok(())
}

fn check_finite_non_negative(name: &str, value: f32) -> eyre::Result<()> {
    if !value.is_finite() || value < 0.0 {
        eyre::bail!("{name} must be finite and non-negative, got {value}");
    }
    Ok(())
}

fn check_positive(name: &str, value: f32) -> eyre::Result<()> {
    if !value.is_finite() || value <= 0.0 {
        eyre::bail!("{name} must be finite and positive, got {value}");
    }
    Ok(())
}

impl Config {
    /// Validate ranges and cross-field consistency.
    pub fn validate(&self) -> eyre::Result<()> {
        check_finite_non_negative("gains.kp", self.gains.kp)?;
        check_finite_non_negative("gains.kd", self.gains.kd)?;
        for (i, &g) in self.gains.cartesian_kp.iter().enumerate() {
            check_finite_non_negative("gains.cartesian_kp", g)
                .map_err(|e| e.wrap_err(format!("entry {i}")))?;
        }
        for (i, &g) in self.gains.cartesian_kd.iter().enumerate() {
            check_finite_non_negative("gains.cartesian_kd", g)
                .map_err(|e| e.wrap_err(format!("entry {i}")))?;
        }

        check_positive("safety.fault_position", self.safety.fault_position)?;
        check_positive("safety.fault_velocity", self.safety.fault_velocity)?;
        check_positive("safety.fault_current", self.safety.fault_current)?;
        check_finite_non_negative("safety.max_current", self.safety.max_current)?;

        check_positive("homing.current_limit", self.homing.current_limit)?;
        check_positive("homing.start_tolerance", self.homing.start_tolerance)?;
        if self.homing.transition_ms == 0 || self.homing.transition_ms > 60_000 {
            eyre::bail!(
                "homing.transition_ms must be in 1..=60000, got {}",
                self.homing.transition_ms
            );
        }

        check_positive("geometry.abduction_offset", self.geometry.abduction_offset)?;
        check_positive("geometry.upper", self.geometry.upper)?;
        check_positive("geometry.lower", self.geometry.lower)?;
        check_positive("geometry.body_length", self.geometry.body_length)?;
        check_positive("geometry.body_width", self.geometry.body_width)?;

        if let Some(directions) = &self.actuators.directions {
            check_signs("actuators.directions", directions)?;
        }
        if let Some(directions) = &self.actuators.homing_directions {
            check_signs("actuators.homing_directions", directions)?;
        }

        if self.hardware.tick_hz == 0 || self.hardware.tick_hz > 1000 {
            eyre::bail!(
                "hardware.tick_hz must be in 1..=1000, got {}",
                self.hardware.tick_hz
            );
        }
        if self.telemetry.interval_ticks == 0 {
            eyre::bail!("telemetry.interval_ticks must be at least 1");
        }
        if self.hardware.front_port.is_some() != self.hardware.rear_port.is_some() {
            eyre::bail!("hardware.front_port and hardware.rear_port must be set together");
        }
        Ok(())
    }
}
