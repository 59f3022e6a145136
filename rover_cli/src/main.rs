mod cli;
mod drive;
mod error_fmt;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    match run(cli) {
        Ok(()) => {}
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&e));
            } else {
                eprintln!("{}", error_fmt::humanize(&e));
            }
            std::process::exit(error_fmt::exit_code_for_error(&e));
        }
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging);

    match &cli.cmd {
        Commands::Drive {
            auto,
            device_url,
            policy_url,
            calibrate_first,
            run_for,
            status_every,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::SeqCst);
            })
            .wrap_err("install Ctrl-C handler")?;

            let opts = drive::DriveOpts {
                auto: *auto,
                device_url: device_url.clone(),
                policy_url: policy_url.clone(),
                calibrate_first: *calibrate_first,
                run_for: *run_for,
                status_every: *status_every,
            };
            drive::drive(&cfg, &opts, cli.sim, &shutdown)
        }
        Commands::Calibrate {
            samples,
            spacing_ms,
            device_url,
        } => drive::calibrate(
            &cfg,
            *samples,
            *spacing_ms,
            device_url.as_deref(),
            cli.sim,
            cli.json,
        ),
        Commands::SelfCheck { device_url } => {
            drive::self_check(&cfg, device_url.as_deref(), cli.sim)
        }
    }
}

/// Load and validate the config; a missing file means defaults.
fn load_config(path: &Path) -> eyre::Result<rover_config::Config> {
    let cfg = if path.exists() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read config {}", path.display()))?;
        rover_config::load_toml(&text)
            .wrap_err_with(|| format!("parse config {}", path.display()))?
    } else {
        rover_config::Config::default()
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Console logging by default; JSON lines to a file when configured.
fn init_tracing(cli: &Cli, logging: &rover_config::Logging) {
    use tracing_subscriber::EnvFilter;

    let level = logging.level.as_deref().unwrap_or(&cli.log_level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "rover.log".as_ref());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .json()
            .init();
    } else if cli.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
