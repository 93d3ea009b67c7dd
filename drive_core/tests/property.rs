//! Property tests over the command path: clamping bounds and masking hold
//! for arbitrary requests.

use drive_core::mocks::{MockBus, MockImu};
use drive_core::{Drive, DriveParams};
use proptest::prelude::*;

fn drive() -> Drive<MockBus, MockImu> {
    Drive::builder()
        .with_front_bus(MockBus::new())
        .with_rear_bus(MockBus::new())
        .with_imu(MockImu::default())
        .with_params(DriveParams::default())
        .build()
        .expect("drive build")
}

proptest! {
    #[test]
    fn commanded_currents_stay_inside_the_ceiling(
        requests in proptest::array::uniform12(-50.0f32..50.0),
        max in 0.0f32..8.0,
    ) {
        let mut d = drive();
        d.set_activations([true; 12]);
        d.set_max_current(max);
        for (i, &value) in requests.iter().enumerate() {
            d.set_current(i, value);
        }
        d.tick().expect("tick");
        for (&commanded, &requested) in
            d.last_commanded_current().iter().zip(requests.iter())
        {
            prop_assert!(commanded.abs() <= max + 1e-6);
            prop_assert_eq!(commanded, requested.clamp(-max, max));
        }
    }

    #[test]
    fn masked_entries_are_forced_to_zero(
        requests in proptest::array::uniform12(-5.0f32..5.0),
        mask in proptest::array::uniform12(any::<bool>()),
    ) {
        let mut d = drive();
        d.set_activations(mask);
        d.set_max_current(8.0);
        for (i, &value) in requests.iter().enumerate() {
            d.set_current(i, value);
        }
        d.tick().expect("tick");
        for (i, &commanded) in d.last_commanded_current().iter().enumerate() {
            if !mask[i] {
                prop_assert_eq!(commanded, 0.0);
            }
        }
    }
}
