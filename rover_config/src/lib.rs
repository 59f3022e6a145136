#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the rover sync stack.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! Every section has sane defaults so a missing config file still yields
//! a usable (simulation-friendly) configuration.
use serde::Deserialize;

/// Robot onboard controller endpoints.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Device {
    /// Base URL of the onboard HTTP controller, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout for `/counts`, `/imu` and motion commands (ms).
    pub timeout_ms: u64,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            timeout_ms: 2_000,
        }
    }
}

/// Remote policy service endpoint.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PolicyEndpoint {
    /// Full URL the sync payload is POSTed to.
    pub url: String,
    /// Round-trip timeout (ms).
    pub timeout_ms: u64,
}

impl Default for PolicyEndpoint {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/decide".to_string(),
            timeout_ms: 3_000,
        }
    }
}

/// Mode-dependent tick periods for the sync loop.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Tick period while the operator drives (ms).
    pub manual_tick_ms: u64,
    /// Tick period while the policy service drives (ms).
    pub auto_tick_ms: u64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            manual_tick_ms: 500,
            auto_tick_ms: 200,
        }
    }
}

/// Gyro bias calibration knobs. The device must stay stationary for
/// roughly `samples * spacing_ms`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    pub samples: u32,
    pub spacing_ms: u64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            samples: 20,
            spacing_ms: 100,
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: Device,
    pub policy: PolicyEndpoint,
    pub schedule: Schedule,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.base_url.is_empty() {
            eyre::bail!("device.base_url must not be empty");
        }
        if !self.device.base_url.starts_with("http://") && !self.device.base_url.starts_with("https://")
        {
            eyre::bail!("device.base_url must start with http:// or https://");
        }
        if self.device.timeout_ms == 0 {
            eyre::bail!("device.timeout_ms must be >= 1");
        }
        if self.device.timeout_ms > 60_000 {
            eyre::bail!("device.timeout_ms is unreasonably large (>60s)");
        }

        // Policy
        if self.policy.url.is_empty() {
            eyre::bail!("policy.url must not be empty");
        }
        if !self.policy.url.starts_with("http://") && !self.policy.url.starts_with("https://") {
            eyre::bail!("policy.url must start with http:// or https://");
        }
        if self.policy.timeout_ms == 0 {
            eyre::bail!("policy.timeout_ms must be >= 1");
        }
        if self.policy.timeout_ms > 60_000 {
            eyre::bail!("policy.timeout_ms is unreasonably large (>60s)");
        }

        // Schedule
        if self.schedule.manual_tick_ms == 0 {
            eyre::bail!("schedule.manual_tick_ms must be >= 1");
        }
        if self.schedule.auto_tick_ms == 0 {
            eyre::bail!("schedule.auto_tick_ms must be >= 1");
        }
        if self.schedule.manual_tick_ms > 10_000 || self.schedule.auto_tick_ms > 10_000 {
            eyre::bail!("schedule tick periods above 10s defeat the loop's purpose");
        }

        // Calibration
        if self.calibration.samples == 0 {
            eyre::bail!("calibration.samples must be >= 1");
        }
        if self.calibration.samples > 10_000 {
            eyre::bail!("calibration.samples is unreasonably large (>10000)");
        }
        if self.calibration.spacing_ms > 10_000 {
            eyre::bail!("calibration.spacing_ms is unreasonably large (>10s)");
        }

        Ok(())
    }
}
