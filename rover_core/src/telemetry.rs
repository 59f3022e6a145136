//! Telemetry sample state.

use rover_traits::Imu;

/// One acquisition: encoder counts plus the raw IMU frame.
///
/// A sample is superseded, never merged, by each successful read; when a
/// read fails the prior value for that part is retained. Counts are
/// treated opaquely — they may wrap or reset when the device reboots.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySample {
    pub left: i64,
    pub right: i64,
    pub imu: Imu,
}
