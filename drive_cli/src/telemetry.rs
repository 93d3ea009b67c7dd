//! JSON-line telemetry built from the drive's accessor surface.
//!
//! Field inclusion is driven by the `[telemetry]` config toggles; the core
//! only provides the accessors.

use drive_core::{ControlMode, Drive};
use drive_traits::{ActuatorBus, Imu};
use serde_json::{Map, Value, json};

fn vector_json(v: &[f32]) -> Value {
    Value::Array(v.iter().map(|&x| json!(x)).collect())
}

pub fn mode_name(mode: ControlMode) -> &'static str {
    match mode {
        ControlMode::Idle => "idle",
        ControlMode::Homing => "homing",
        ControlMode::PositionControl => "position",
        ControlMode::CartesianPositionControl => "cartesian",
        ControlMode::CurrentControl => "current",
        ControlMode::Error => "error",
    }
}

/// Render one telemetry record for the current tick.
pub fn record<B: ActuatorBus, I: Imu>(
    drive: &Drive<B, I>,
    opts: &drive_config::Telemetry,
    tick: u64,
) -> Value {
    let mut obj = Map::new();
    obj.insert("tick".into(), json!(tick));
    obj.insert("mode".into(), json!(mode_name(drive.mode())));
    if opts.positions {
        obj.insert("pos".into(), vector_json(&drive.positions()));
    }
    if opts.velocities {
        obj.insert("vel".into(), vector_json(&drive.velocities()));
    }
    if opts.currents {
        obj.insert("cur".into(), vector_json(&drive.currents()));
    }
    if opts.position_references {
        obj.insert("pref".into(), vector_json(drive.position_reference()));
    }
    if opts.velocity_references {
        obj.insert("vref".into(), vector_json(drive.velocity_reference()));
    }
    if opts.current_references {
        obj.insert("cref".into(), vector_json(drive.current_reference()));
    }
    if opts.last_current {
        obj.insert("lcur".into(), vector_json(drive.last_commanded_current()));
    }
    if opts.orientation {
        let o = drive.orientation();
        obj.insert("yaw".into(), json!(o.yaw));
        obj.insert("pitch".into(), json!(o.pitch));
        obj.insert("roll".into(), json!(o.roll));
        obj.insert("yaw_rate".into(), json!(o.yaw_rate));
        obj.insert("pitch_rate".into(), json!(o.pitch_rate));
        obj.insert("roll_rate".into(), json!(o.roll_rate));
    }
    if opts.power {
        obj.insert("elec_w".into(), json!(drive.total_electrical_power()));
        obj.insert("mech_w".into(), json!(drive.total_mechanical_power()));
    }
    Value::Object(obj)
}
