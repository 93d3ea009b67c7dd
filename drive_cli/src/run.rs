//! Control loop wiring: hardware assembly, homing, pacing, and stats.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use drive_core::{ControlMode, Drive, DriveParams};
use drive_hardware::{SimulatedBus, SimulatedImu};
use drive_traits::clock::{Clock, MonotonicClock};
use drive_traits::{ActuatorBus, Imu};

use crate::cli::RtLock;
use crate::rt::setup_rt_once;
use crate::telemetry;

pub struct RunOpts {
    pub ticks: Option<u64>,
    pub rate_hz: Option<u32>,
    pub no_home: bool,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: Option<RtLock>,
    pub rt_cpu: Option<usize>,
    pub stats: bool,
}

/// Assemble the drive (bridge hardware when ports are configured and the
/// `hardware` feature is on, otherwise the simulated plant) and run the
/// tick loop until the tick budget or an interrupt.
pub fn run(
    cfg: &drive_config::Config,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    setup_rt_once(
        opts.rt,
        opts.rt_prio,
        opts.rt_lock.unwrap_or(RtLock::os_default()),
        opts.rt_cpu,
    );

    let tick_hz = opts.rate_hz.unwrap_or(cfg.hardware.tick_hz).max(1);
    let params = DriveParams::from(cfg);

    #[cfg(feature = "hardware")]
    if let (Some(front), Some(rear)) = (&cfg.hardware.front_port, &cfg.hardware.rear_port) {
        use eyre::WrapErr;
        let front = drive_hardware::bridge::BridgeBus::open(front).wrap_err("opening front bus")?;
        let rear = drive_hardware::bridge::BridgeBus::open(rear).wrap_err("opening rear bus")?;
        let drive = Drive::builder()
            .with_front_bus(front)
            .with_rear_bus(rear)
            .with_imu(SimulatedImu::default())
            .with_params(params.clone())
            .build()?;
        return run_loop(drive, cfg, opts, tick_hz, &shutdown);
    }

    let dt = 1.0 / tick_hz as f32;
    let drive = Drive::builder()
        .with_front_bus(SimulatedBus::new(dt))
        .with_rear_bus(SimulatedBus::new(dt))
        .with_imu(SimulatedImu::default())
        .with_params(params)
        .build()?;
    run_loop(drive, cfg, opts, tick_hz, &shutdown)
}

fn run_loop<B: ActuatorBus, I: Imu>(
    mut drive: Drive<B, I>,
    cfg: &drive_config::Config,
    opts: &RunOpts,
    tick_hz: u32,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    drive.setup_imu(cfg.hardware.imu_filter_hz)?;
    if !opts.no_home {
        drive.execute_homing();
    }

    let clock = MonotonicClock::new();
    let period = Duration::from_micros(1_000_000 / u64::from(tick_hz));
    let mut latencies: Vec<u64> = Vec::new();
    let mut missed_deadlines = 0usize;
    let mut tick: u64 = 0;
    tracing::info!(tick_hz, homing = !opts.no_home, "drive loop start");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested, returning to idle");
            drive.set_idle();
            let _ = drive.tick();
            break;
        }

        let t_start = Instant::now();
        let mode = drive.tick()?;
        drive.update_imu()?;
        tick += 1;

        if cfg.telemetry.enabled && tick % cfg.telemetry.interval_ticks == 0 {
            println!("{}", telemetry::record(&drive, &cfg.telemetry, tick));
        }
        if mode == ControlMode::Error
            && let Some(fault) = drive.last_fault()
        {
            tracing::debug!(fault = %fault, "holding fail-safe zero command");
        }

        let latency = t_start.elapsed();
        if opts.stats {
            latencies.push(latency.as_micros() as u64);
            if latency > period {
                missed_deadlines += 1;
            }
        }

        if let Some(n) = opts.ticks
            && tick >= n
        {
            break;
        }
        if latency < period {
            clock.sleep(period - latency);
        }
    }

    if opts.stats && !latencies.is_empty() {
        print_stats(&latencies, tick, missed_deadlines, tick_hz);
    }
    Ok(())
}

/// Boot a simulated drive and run a handful of ticks; any fault or non-zero
/// idle command fails the check.
pub fn self_check() -> eyre::Result<()> {
    let dt = 0.004;
    let mut drive = Drive::builder()
        .with_front_bus(SimulatedBus::new(dt))
        .with_rear_bus(SimulatedBus::new(dt))
        .with_imu(SimulatedImu::default())
        .build()?;
    drive.setup_imu(50)?;
    for _ in 0..5 {
        drive.tick()?;
        drive.update_imu()?;
    }
    if drive.mode() != ControlMode::Idle {
        eyre::bail!("self-check failed: drive left idle ({:?})", drive.mode());
    }
    if drive.last_commanded_current().iter().any(|&c| c != 0.0) {
        eyre::bail!("self-check failed: idle commanded non-zero current");
    }
    println!("self-check: ok");
    Ok(())
}

/// Print tick latency/jitter stats to stderr.
fn print_stats(latencies: &[u64], tick_count: u64, missed_deadlines: usize, tick_hz: u32) {
    let expected_period_us = 1_000_000 / u64::from(tick_hz.max(1));
    let min = *latencies.iter().min().unwrap_or(&0);
    let max = *latencies.iter().max().unwrap_or(&0);
    let avg = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
    let stdev = if latencies.len() > 1 {
        let var = latencies
            .iter()
            .map(|&x| (x as f64 - avg).powi(2))
            .sum::<f64>()
            / (latencies.len() as f64 - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    eprintln!("\n--- Drive Stats ---");
    eprintln!("Ticks: {tick_count}");
    eprintln!("Period (us): {expected_period_us}");
    eprintln!("Latency min/avg/max/stdev (us): {min:.0} / {avg:.1} / {max:.0} / {stdev:.1}");
    eprintln!("Missed deadlines (> period): {missed_deadlines}");
    eprintln!("-------------------\n");
}
