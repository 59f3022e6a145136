//! Transport-agnostic seams for the rover sync stack.
//!
//! This crate stays dependency-free: the wire vocabulary (`Command`,
//! `Mode`, `Imu`, `SyncPayload`), the device and policy seams (`Robot`,
//! `Policy`) and the clock abstraction live here so that `rover_core`
//! and the transport implementations in `rover_link` can agree on types
//! without depending on each other.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::collections::BTreeMap;
use std::time::Duration;

/// One IMU frame: named axes mapped to readings.
///
/// Keys include at least `gx`, `gy`, `gz`; any other keys the device
/// reports are carried through untouched. A `BTreeMap` keeps the wire
/// encoding deterministic.
pub type Imu = BTreeMap<String, f64>;

/// Motion commands accepted by the robot.
///
/// The set is closed; anything else coming back from the policy service
/// fails [`Command::parse`] and is discarded upstream, never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Command {
    /// Wire name. Doubles as the device endpoint path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
            Command::Stop => "stop",
        }
    }

    /// Parse a wire name; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(Command::Forward),
            "backward" => Some(Command::Backward),
            "left" => Some(Command::Left),
            "right" => Some(Command::Right),
            "stop" => Some(Command::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control mode. Exactly one is active at a time; switching to `Manual`
/// always forces an immediate stop upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Manual,
    Auto,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Manual => "manual",
            Mode::Auto => "auto",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outbound record for one sync cycle.
///
/// Built fresh each cycle from the currently applied action and mode;
/// never persisted on this side.
#[derive(Debug, Clone)]
pub struct SyncPayload {
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Opaque session tag; affects logging only, never control.
    pub run_id: String,
    /// Bias-corrected IMU frame.
    pub imu: Imu,
    /// Left encoder count as last read.
    pub left: i64,
    /// Right encoder count as last read.
    pub right: i64,
    /// Action currently in effect when the payload was built.
    pub action: Command,
    pub mode: Mode,
}

/// Gateway to the robot's sensor and motion surface.
///
/// Implementations take `&self` so one gateway handle can be shared
/// between the sync loop and out-of-band override paths; per-call state
/// (e.g. last-good counts) is interior.
pub trait Robot {
    /// Read the left/right encoder counts.
    fn read_counts(
        &self,
        timeout: Duration,
    ) -> Result<(i64, i64), Box<dyn std::error::Error + Send + Sync>>;

    /// Read one raw (uncorrected) IMU frame.
    fn read_imu(&self, timeout: Duration) -> Result<Imu, Box<dyn std::error::Error + Send + Sync>>;

    /// Issue a motion command. Commands are idempotent-in-effect: sending
    /// the same command twice is harmless.
    fn execute(&self, cmd: Command) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// The remote decision service.
pub trait Policy {
    /// Post one cycle's payload and return the suggested action, if any.
    ///
    /// `Ok(None)` means the service answered but had no suggestion; that
    /// is a normal outcome, not a failure. `Err` is a synchronization
    /// failure (transport error, non-200 status, unparseable response).
    fn decide(
        &self,
        payload: &SyncPayload,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_round_trip() {
        for cmd in [
            Command::Forward,
            Command::Backward,
            Command::Left,
            Command::Right,
            Command::Stop,
        ] {
            assert_eq!(Command::parse(cmd.as_str()), Some(cmd));
        }
    }

    #[test]
    fn unknown_command_names_are_rejected() {
        assert_eq!(Command::parse("spin"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("FORWARD"), None);
    }
}
