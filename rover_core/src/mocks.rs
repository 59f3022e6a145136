//! Test and helper mocks for rover_core.
//!
//! Shared across the crate's unit and integration tests; also handy for
//! downstream crates that want to exercise the loop without a device.

use rover_traits::{Command, Imu, Policy, Robot, SyncPayload};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

fn poisoned<T>(e: std::sync::PoisonError<T>) -> T {
    e.into_inner()
}

/// Robot double: fixed telemetry, optional per-surface failure injection,
/// optional scripted IMU sequence, and a log of executed commands.
pub struct RecordingRobot {
    counts: Mutex<(i64, i64)>,
    imu: Mutex<Imu>,
    imu_script: Mutex<VecDeque<Result<Imu, String>>>,
    fail_counts: AtomicBool,
    fail_imu: AtomicBool,
    fail_execute: AtomicBool,
    executed: Mutex<Vec<Command>>,
    imu_reads: AtomicU32,
}

impl Default for RecordingRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRobot {
    pub fn new() -> Self {
        Self {
            counts: Mutex::new((0, 0)),
            imu: Mutex::new(Imu::new()),
            imu_script: Mutex::new(VecDeque::new()),
            fail_counts: AtomicBool::new(false),
            fail_imu: AtomicBool::new(false),
            fail_execute: AtomicBool::new(false),
            executed: Mutex::new(Vec::new()),
            imu_reads: AtomicU32::new(0),
        }
    }

    pub fn set_counts(&self, left: i64, right: i64) {
        *self.counts.lock().unwrap_or_else(poisoned) = (left, right);
    }

    pub fn set_imu(&self, pairs: &[(&str, f64)]) {
        *self.imu.lock().unwrap_or_else(poisoned) =
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    }

    /// Queue IMU read results consumed before the fixed frame; `Err`
    /// entries simulate failed fetches.
    pub fn push_imu_script<I>(&self, items: I)
    where
        I: IntoIterator<Item = Result<Imu, String>>,
    {
        self.imu_script
            .lock()
            .unwrap_or_else(poisoned)
            .extend(items);
    }

    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::Relaxed);
    }

    pub fn fail_imu(&self, fail: bool) {
        self.fail_imu.store(fail, Ordering::Relaxed);
    }

    pub fn fail_execute(&self, fail: bool) {
        self.fail_execute.store(fail, Ordering::Relaxed);
    }

    /// All commands executed so far, in order.
    pub fn executed(&self) -> Vec<Command> {
        self.executed.lock().unwrap_or_else(poisoned).clone()
    }

    pub fn imu_reads(&self) -> u32 {
        self.imu_reads.load(Ordering::Relaxed)
    }
}

impl Robot for RecordingRobot {
    fn read_counts(&self, _timeout: Duration) -> Result<(i64, i64), BoxErr> {
        if self.fail_counts.load(Ordering::Relaxed) {
            return Err("counts unavailable".into());
        }
        Ok(*self.counts.lock().unwrap_or_else(poisoned))
    }

    fn read_imu(&self, _timeout: Duration) -> Result<Imu, BoxErr> {
        self.imu_reads.fetch_add(1, Ordering::Relaxed);
        if let Some(scripted) = self.imu_script.lock().unwrap_or_else(poisoned).pop_front() {
            return scripted.map_err(Into::into);
        }
        if self.fail_imu.load(Ordering::Relaxed) {
            return Err("imu unavailable".into());
        }
        Ok(self.imu.lock().unwrap_or_else(poisoned).clone())
    }

    fn execute(&self, cmd: Command) -> Result<(), BoxErr> {
        self.executed.lock().unwrap_or_else(poisoned).push(cmd);
        if self.fail_execute.load(Ordering::Relaxed) {
            return Err("command endpoint unreachable".into());
        }
        Ok(())
    }
}

/// Policy double driven by a script of decisions; once the script runs
/// dry, every further call yields the configured fallback.
pub struct ScriptPolicy {
    script: Mutex<VecDeque<Result<Option<String>, String>>>,
    fallback: Option<String>,
    calls: AtomicU32,
}

impl ScriptPolicy {
    /// Always suggest the same action.
    pub fn always(action: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(action.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    /// Always answer with "no suggestion".
    pub fn silent() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Play back the given decisions in order, then fall back to silence.
    pub fn script<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<Option<String>, String>>,
    {
        Self {
            script: Mutex::new(items.into_iter().collect()),
            fallback: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Policy for ScriptPolicy {
    fn decide(&self, _payload: &SyncPayload) -> Result<Option<String>, BoxErr> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(next) = self.script.lock().unwrap_or_else(poisoned).pop_front() {
            return next.map_err(Into::into);
        }
        Ok(self.fallback.clone())
    }
}
