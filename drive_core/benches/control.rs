//! Per-tick control path benchmarks: the cartesian handler dominates the
//! tick budget, so it is the one worth watching.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use drive_core::kinematics::{LegGeometry, forward_kinematics, leg_jacobian};
use drive_core::mocks::{MockBus, MockImu};
use drive_core::{Drive, DriveParams};
use nalgebra::{Matrix3, Vector3};

fn bench_kinematics(c: &mut Criterion) {
    let geometry = LegGeometry::default();
    let q = Vector3::new(0.3, -0.4, 0.7);
    c.bench_function("forward_kinematics", |b| {
        b.iter(|| forward_kinematics(black_box(q), &geometry, 0))
    });
    c.bench_function("leg_jacobian", |b| {
        b.iter(|| leg_jacobian(black_box(q), &geometry, 0))
    });
}

fn bench_cartesian_tick(c: &mut Criterion) {
    let mut drive: Drive<MockBus, MockImu> = Drive::builder()
        .with_front_bus(MockBus::new())
        .with_rear_bus(MockBus::new())
        .with_imu(MockImu::default())
        .with_params(DriveParams::default())
        .build()
        .expect("drive build");
    drive.set_activations([true; 12]);
    drive.set_max_current(2.0);
    drive.set_cartesian_gains(Matrix3::identity() * 800.0, Matrix3::identity() * 30.0);
    let mut reference = drive.default_cartesian_positions();
    for leg in 0..4 {
        reference[3 * leg + 2] += 0.01;
    }
    drive.set_cartesian_positions(reference);

    c.bench_function("cartesian_tick", |b| {
        b.iter(|| drive.tick().expect("tick"))
    });
}

criterion_group!(benches, bench_kinematics, bench_cartesian_tick);
criterion_main!(benches);
