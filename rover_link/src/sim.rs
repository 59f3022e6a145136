//! In-process simulation of the device and the policy service.
//!
//! Lets the CLI (and tests) drive the full loop with no robot and no
//! network. The simulated robot integrates encoder counts from the
//! command currently in effect and reports a constant gyro drift, which
//! makes calibration visibly do something.

use rover_traits::{Command, Imu, Policy, Robot, SyncPayload};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

struct SimState {
    left: i64,
    right: i64,
    cmd: Command,
}

/// Simulated robot. Counts advance per read according to the command in
/// effect; the IMU frame carries the configured drift plus gravity.
pub struct SimRobot {
    state: Mutex<SimState>,
    drift: (f64, f64, f64),
}

impl Default for SimRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRobot {
    pub fn new() -> Self {
        Self::with_drift(0.02, -0.01, 0.05)
    }

    pub fn with_drift(gx: f64, gy: f64, gz: f64) -> Self {
        Self {
            state: Mutex::new(SimState {
                left: 0,
                right: 0,
                cmd: Command::Stop,
            }),
            drift: (gx, gy, gz),
        }
    }
}

impl Robot for SimRobot {
    fn read_counts(&self, _timeout: Duration) -> Result<(i64, i64), BoxErr> {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (dl, dr) = match st.cmd {
            Command::Forward => (8, 8),
            Command::Backward => (-8, -8),
            Command::Left => (-3, 3),
            Command::Right => (3, -3),
            Command::Stop => (0, 0),
        };
        st.left += dl;
        st.right += dr;
        Ok((st.left, st.right))
    }

    fn read_imu(&self, _timeout: Duration) -> Result<Imu, BoxErr> {
        let (gx, gy, gz) = self.drift;
        Ok([
            ("gx".to_string(), gx),
            ("gy".to_string(), gy),
            ("gz".to_string(), gz),
            ("ax".to_string(), 0.0),
            ("ay".to_string(), 0.0),
            ("az".to_string(), 9.81),
        ]
        .into_iter()
        .collect())
    }

    fn execute(&self, cmd: Command) -> Result<(), BoxErr> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).cmd = cmd;
        tracing::debug!(action = %cmd, "sim command");
        Ok(())
    }
}

/// Simulated policy: cycles a fixed patrol script, one entry per cycle.
pub struct SimPolicy {
    script: Vec<&'static str>,
    at: AtomicUsize,
}

impl SimPolicy {
    /// A conservative canned driver: creep forward, pause, turn, pause.
    pub fn patrol() -> Self {
        Self {
            script: vec!["forward", "forward", "stop", "left", "stop"],
            at: AtomicUsize::new(0),
        }
    }

    /// Never suggests anything.
    pub fn silent() -> Self {
        Self {
            script: Vec::new(),
            at: AtomicUsize::new(0),
        }
    }
}

impl Policy for SimPolicy {
    fn decide(&self, _payload: &SyncPayload) -> Result<Option<String>, BoxErr> {
        if self.script.is_empty() {
            return Ok(None);
        }
        let i = self.at.fetch_add(1, Ordering::Relaxed) % self.script.len();
        Ok(Some(self.script[i].to_string()))
    }
}
