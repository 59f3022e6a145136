//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "rover", version, about = "Rover sync-loop CLI")]
pub struct Cli {
    /// Path to config TOML (defaults apply when the file is absent)
    #[arg(long, value_name = "FILE", default_value = "etc/rover.toml")]
    pub config: PathBuf,

    /// Log and print structured JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Use the built-in simulated robot and policy (no network)
    #[arg(long, action = ArgAction::SetTrue)]
    pub sim: bool,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sync loop until interrupted
    Drive {
        /// Start in auto mode (default is manual: the loop reports but
        /// only the operator moves the robot)
        #[arg(long, action = ArgAction::SetTrue)]
        auto: bool,
        /// Override the device base URL from the config
        #[arg(long, value_name = "URL")]
        device_url: Option<String>,
        /// Override the policy endpoint URL from the config
        #[arg(long, value_name = "URL")]
        policy_url: Option<String>,
        /// Estimate the gyro bias before starting (robot must be still)
        #[arg(long, action = ArgAction::SetTrue)]
        calibrate_first: bool,
        /// Exit after this many seconds instead of waiting for Ctrl-C
        #[arg(long, value_name = "SECS")]
        run_for: Option<u64>,
        /// Print a state snapshot every N seconds (0 disables)
        #[arg(long, value_name = "SECS", default_value_t = 2)]
        status_every: u64,
    },
    /// Estimate the gyro bias once and print it
    Calibrate {
        /// Number of stationary samples (config default: 20)
        #[arg(long, value_name = "N")]
        samples: Option<u32>,
        /// Spacing between samples in ms (config default: 100)
        #[arg(long, value_name = "MS")]
        spacing_ms: Option<u64>,
        /// Override the device base URL from the config
        #[arg(long, value_name = "URL")]
        device_url: Option<String>,
    },
    /// Probe the device sensor endpoints once and report health
    SelfCheck {
        /// Override the device base URL from the config
        #[arg(long, value_name = "URL")]
        device_url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
