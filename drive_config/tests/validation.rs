//! Schema parsing and validation behavior.

use drive_config::{Config, load_toml};
use rstest::rstest;

#[test]
fn empty_config_parses_to_valid_defaults() {
    let cfg = load_toml("").expect("parse");
    cfg.validate().expect("defaults validate");
    assert_eq!(cfg.hardware.tick_hz, 250);
    assert_eq!(cfg.safety.max_current, 0.0);
    assert_eq!(cfg.homing.transition_ms, 5000);
    assert!(cfg.actuators.directions.is_none());
}

#[test]
fn full_config_round_trips() {
    let text = r#"
[gains]
kp = 8.0
kd = 0.2
cartesian_kp = [500.0, 500.0, 900.0]
cartesian_kd = [20.0, 20.0, 20.0]

[safety]
fault_position = 3.1
fault_velocity = 6.0
fault_current = 10.0
max_current = 2.0

[homing]
current_limit = 1.5
start_tolerance = 0.1
transition_ms = 4000

[geometry]
abduction_offset = 0.05
upper = 0.09
lower = 0.12
body_length = 0.3
body_width = 0.12

[actuators]
directions = [-1, -1, 1, -1, 1, -1, -1, -1, 1, -1, 1, -1]

[telemetry]
enabled = true
interval_ticks = 10
velocities = false

[logging]
level = "debug"

[hardware]
tick_hz = 500
imu_filter_hz = 100
"#;
    let cfg = load_toml(text).expect("parse");
    cfg.validate().expect("validate");
    assert_eq!(cfg.gains.cartesian_kp[2], 900.0);
    assert_eq!(cfg.homing.transition_ms, 4000);
    assert_eq!(cfg.telemetry.interval_ticks, 10);
    assert!(!cfg.telemetry.velocities);
    assert_eq!(cfg.hardware.tick_hz, 500);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[rstest]
#[case("[actuators]\ndirections = [1, -1]")] // wrong length
#[case("[actuators]\ndirections = [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0.5]")] // bad sign
#[case("[safety]\nfault_velocity = -1.0")]
#[case("[safety]\nfault_current = 0.0")]
#[case("[homing]\ntransition_ms = 0")]
#[case("[homing]\nstart_tolerance = 0.0")]
#[case("[geometry]\nupper = -0.1")]
#[case("[hardware]\ntick_hz = 0")]
#[case("[hardware]\ntick_hz = 5000")]
#[case("[telemetry]\ninterval_ticks = 0")]
#[case("[hardware]\nfront_port = \"/dev/ttyACM0\"")] // rear missing
fn invalid_configs_are_rejected(#[case] text: &str) {
    let cfg = load_toml(text).expect("parse");
    assert!(cfg.validate().is_err(), "expected rejection for: {text}");
}

#[test]
fn unknown_fields_do_not_break_parsing() {
    // Forward compatibility: extra keys are ignored by serde defaults.
    let cfg: Config = load_toml("[gains]\nkp = 1.0\nextra = 42\n").expect("parse");
    assert_eq!(cfg.gains.kp, 1.0);
}
