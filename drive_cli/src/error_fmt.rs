//! Human-readable error descriptions and structured JSON error formatting.

use drive_core::error::{BuildError, DriveError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingFrontBus | BuildError::MissingRearBus => {
                "What happened: A bus was not provided to the drive.\nLikely causes: The bridge port failed to open or was not wired into the builder.\nHow to fix: Check [hardware] front_port/rear_port in the config and the USB wiring.".to_string()
            }
            BuildError::MissingImu => {
                "What happened: No IMU was provided to the drive.\nLikely causes: Sensor init failed or was not wired into the builder.\nHow to fix: Ensure the IMU is created successfully and passed via with_imu(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DriveError>() {
        return match de {
            DriveError::Timeout => {
                "What happened: A bus read timed out.\nLikely causes: Bridge unpowered, wrong port, or baud mismatch.\nHow to fix: Verify the serial ports in [hardware] and the bridge power.".to_string()
            }
            DriveError::PositionFault { actuator, .. } => format!(
                "What happened: Actuator {actuator} exceeded the position fault limit.\nLikely causes: A leg was moved past its range, or zero offsets are stale.\nHow to fix: Return to idle, re-run homing, and check safety.fault_position."
            ),
            DriveError::VelocityFault { actuator, .. } => format!(
                "What happened: Actuator {actuator} exceeded the velocity fault limit.\nLikely causes: An impact, a gain too high, or a slipping transmission.\nHow to fix: Lower gains or raise safety.fault_velocity after checking mechanics."
            ),
            DriveError::CurrentFault { actuator, .. } => format!(
                "What happened: The clamped command for actuator {actuator} exceeded the current fault limit.\nLikely causes: max_current raised above fault_current with an aggressive command.\nHow to fix: Review safety.max_current and safety.fault_current."
            ),
            DriveError::HomingStart { actuator, .. } => format!(
                "What happened: Homing started with actuator {actuator} away from its mechanical stop.\nLikely causes: The legs were not folded against the stops before homing.\nHow to fix: Fold every joint to its stop, power-cycle the controllers, and re-run homing."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {err}"
    )
}

/// Map fault kinds (if present) to stable exit codes; other errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(de) = err.downcast_ref::<DriveError>() {
        return match de {
            DriveError::Bus(_) | DriveError::Timeout => 2,
            DriveError::PositionFault { .. } => 3,
            DriveError::VelocityFault { .. } => 4,
            DriveError::CurrentFault { .. } => 5,
            DriveError::HomingStart { .. } => 6,
            DriveError::InvalidActuator(_) => 7,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(de) = err.downcast_ref::<DriveError>() {
        match de {
            DriveError::PositionFault { .. } => "PositionFault",
            DriveError::VelocityFault { .. } => "VelocityFault",
            DriveError::CurrentFault { .. } => "CurrentFault",
            DriveError::HomingStart { .. } => "HomingStart",
            DriveError::InvalidActuator(_) => "InvalidActuator",
            DriveError::Bus(_) => "Bus",
            DriveError::Timeout => "Timeout",
        }
    } else {
        "Error"
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_errors_get_stable_exit_codes() {
        let err = eyre::Report::new(DriveError::HomingStart {
            actuator: 2,
            position: 0.5,
        });
        assert_eq!(exit_code_for_error(&err), 6);
        let err = eyre::Report::new(DriveError::Timeout);
        assert_eq!(exit_code_for_error(&err), 2);
    }

    #[test]
    fn json_errors_carry_the_reason() {
        let err = eyre::Report::new(DriveError::InvalidActuator(14));
        let text = format_error_json(&err);
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["reason"], "InvalidActuator");
    }
}
