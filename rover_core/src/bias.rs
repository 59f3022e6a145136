//! Gyro bias estimation and correction.
//!
//! The bias is the robot's static gyroscope drift, sampled while the
//! device is stationary. It lives for the whole session and is only ever
//! replaced by re-running the calibration procedure.

use rover_traits::{Clock, Imu, Robot};
use std::time::Duration;

/// Axes the bias applies to. Every other IMU key passes through the
/// corrector untouched.
pub const GYRO_AXES: [&str; 3] = ["gx", "gy", "gz"];

/// Per-axis gyroscope offset subtracted from raw readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GyroBias {
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

impl GyroBias {
    fn axis(&self, name: &str) -> f64 {
        match name {
            "gx" => self.gx,
            "gy" => self.gy,
            "gz" => self.gz,
            _ => 0.0,
        }
    }
}

/// Calibration knobs: how many stationary samples to take and how far
/// apart. The device must not move for roughly `samples * spacing_ms`.
#[derive(Debug, Clone)]
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

/// Result of one calibration pass.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationReport {
    pub bias: GyroBias,
    /// Samples that actually contributed to the mean.
    pub collected: u32,
    pub requested: u32,
}

/// Apply the bias to a raw IMU frame.
///
/// All keys are copied; only the gyro axes are rewritten as `raw - bias`.
/// A missing or non-finite raw axis is treated as 0.0 before subtraction.
/// Pure: no I/O, no state.
pub fn correct(raw: &Imu, bias: &GyroBias) -> Imu {
    let mut out = raw.clone();
    for axis in GYRO_AXES {
        let v = raw
            .get(axis)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
        out.insert(axis.to_string(), v - bias.axis(axis));
    }
    out
}

/// Sample the stationary gyro and average the readings into a bias.
///
/// Reads are taken sequentially, `spacing_ms` apart via the injected
/// clock. A read that fails is skipped outright — not counted, not
/// zero-filled — and the mean is taken over the successes only. With
/// zero successes `previous` is returned unchanged; that is deliberate
/// (no divide-by-zero, no update), not an error.
pub fn estimate<R: Robot + ?Sized>(
    robot: &R,
    clock: &dyn Clock,
    cfg: &CalibrationCfg,
    read_timeout: Duration,
    previous: GyroBias,
) -> CalibrationReport {
    let spacing = Duration::from_millis(cfg.spacing_ms);
    let mut sums = [0.0_f64; 3];
    let mut collected = 0_u32;

    for i in 0..cfg.samples {
        match robot.read_imu(read_timeout) {
            Ok(frame) => {
                for (k, sum) in GYRO_AXES.iter().zip(sums.iter_mut()) {
                    *sum += frame
                        .get(*k)
                        .copied()
                        .filter(|v| v.is_finite())
                        .unwrap_or(0.0);
                }
                collected += 1;
            }
            Err(e) => {
                tracing::debug!(sample = i, error = %e, "calibration sample skipped");
            }
        }
        clock.sleep(spacing);
    }

    let bias = if collected == 0 {
        tracing::warn!(
            requested = cfg.samples,
            "calibration collected no samples; bias unchanged"
        );
        previous
    } else {
        let n = f64::from(collected);
        GyroBias {
            gx: sums[0] / n,
            gy: sums[1] / n,
            gz: sums[2] / n,
        }
    };

    CalibrationReport {
        bias,
        collected,
        requested: cfg.samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pairs: &[(&str, f64)]) -> Imu {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn correct_subtracts_only_gyro_axes() {
        let raw = frame(&[("gx", 1.0), ("gy", 2.0), ("gz", 3.0), ("ax", 9.8)]);
        let bias = GyroBias {
            gx: 0.1,
            gy: 0.2,
            gz: 0.3,
        };
        let out = correct(&raw, &bias);
        assert!((out["gx"] - 0.9).abs() < 1e-9);
        assert!((out["gy"] - 1.8).abs() < 1e-9);
        assert!((out["gz"] - 2.7).abs() < 1e-9);
        // Accelerometer passes through untouched.
        assert!((out["ax"] - 9.8).abs() < 1e-9);
    }

    #[test]
    fn correct_treats_missing_axis_as_zero() {
        let raw = frame(&[("gx", 1.0)]);
        let bias = GyroBias {
            gx: 0.5,
            gy: 0.25,
            gz: 0.0,
        };
        let out = correct(&raw, &bias);
        assert!((out["gx"] - 0.5).abs() < 1e-9);
        assert!((out["gy"] + 0.25).abs() < 1e-9);
        assert!((out["gz"] - 0.0).abs() < 1e-9);
    }

    #[test]
    fn correct_treats_nan_axis_as_zero() {
        let raw = frame(&[("gx", f64::NAN)]);
        let bias = GyroBias {
            gx: 0.1,
            ..GyroBias::default()
        };
        let out = correct(&raw, &bias);
        assert!((out["gx"] + 0.1).abs() < 1e-9);
    }
}
