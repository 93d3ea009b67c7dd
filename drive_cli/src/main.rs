//! Operator binary for the quadruped leg drive.

mod cli;
mod error_fmt;
mod rt;
mod run;
mod telemetry;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("Warning: failed to install error reporter: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            report_error(&err);
            std::process::exit(error_fmt::exit_code_for_error(&err));
        }
    };
    init_tracing(cli.json, &cli.log_level, &cfg.logging);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install ctrl-c handler");
        }
    }

    let result = match cli.cmd {
        Commands::Run {
            ticks,
            rate_hz,
            no_home,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
            stats,
        } => run::run(
            &cfg,
            &run::RunOpts {
                ticks,
                rate_hz,
                no_home,
                rt,
                rt_prio,
                rt_lock,
                rt_cpu,
                stats,
            },
            shutdown,
        ),
        Commands::SelfCheck => run::self_check(),
        Commands::Health => {
            println!(
                "{}",
                serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })
            );
            Ok(())
        }
    };

    if let Err(err) = result {
        report_error(&err);
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn report_error(err: &eyre::Report) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        eprintln!("{}", error_fmt::format_error_json(err));
    } else {
        eprintln!("{}", error_fmt::humanize(err));
    }
}

/// Read, parse and validate the config; a missing file falls back to the
/// built-in defaults.
fn load_config(path: &Path) -> eyre::Result<drive_config::Config> {
    if !path.exists() {
        eprintln!(
            "Note: config {} not found, using built-in defaults",
            path.display()
        );
        return Ok(drive_config::Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let cfg = drive_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parsing config {}: {e}", path.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn init_tracing(json: bool, level: &str, logging: &drive_config::Logging) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let level = logging.level.as_deref().unwrap_or(level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let console = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = logging.file.as_deref().map(|path| {
        let path = Path::new(path);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "quadrive.log".into());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
}
