//! Mappings from the TOML-facing `rover_config` structs onto the runtime
//! configuration types used by the engine.

use crate::bias::CalibrationCfg;
use crate::controller::Timeouts;
use crate::service::ScheduleCfg;

impl From<&rover_config::Schedule> for ScheduleCfg {
    fn from(s: &rover_config::Schedule) -> Self {
        Self {
            manual_tick_ms: s.manual_tick_ms,
            auto_tick_ms: s.auto_tick_ms,
        }
    }
}

impl From<&rover_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &rover_config::CalibrationCfg) -> Self {
        Self {
            samples: c.samples,
            spacing_ms: c.spacing_ms,
        }
    }
}

impl From<&rover_config::Config> for Timeouts {
    fn from(cfg: &rover_config::Config) -> Self {
        Self {
            device_ms: cfg.device.timeout_ms,
            policy_ms: cfg.policy.timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_map_from_both_endpoints() {
        let cfg = rover_config::Config::default();
        let t = Timeouts::from(&cfg);
        assert_eq!(t.device_ms, cfg.device.timeout_ms);
        assert_eq!(t.policy_ms, cfg.policy.timeout_ms);
    }
}
