//! The sync-loop controller.
//!
//! One `step()` is one full cycle: acquire → correct → report → act.
//! The controller owns every piece of long-lived loop state (sample,
//! bias, mode, run id, applied action, dedupe baseline); everything else
//! observes it through cloned [`Snapshot`]s. Scheduling and message
//! plumbing live in [`crate::service`].

use crate::bias::{self, CalibrationCfg, CalibrationReport, GyroBias};
use crate::dispatch::Dispatcher;
use crate::session;
use crate::telemetry::TelemetrySample;
use rover_traits::{Clock, Command, Imu, Mode, Policy, Robot, SyncPayload};
use std::sync::Arc;
use std::time::Duration;

/// Per-collaborator call timeouts.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait per device read or motion command (ms).
    pub device_ms: u64,
    /// Max wait for the policy round-trip (ms).
    pub policy_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            device_ms: 2_000,
            policy_ms: 3_000,
        }
    }
}

/// What a single pass did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Pass completed and a novel action went out to the device.
    Dispatched(Command),
    /// Pass completed with nothing to dispatch: no suggestion, an unknown
    /// suggestion, a deduped repeat, or manual mode.
    NoChange,
    /// Both device reads failed; the cycle was aborted before reporting.
    AcquireFailed,
    /// The policy round-trip failed; the cycle was aborted after the
    /// safety stop (in auto mode).
    SyncFailed,
}

/// Display-facing snapshot of loop state. Cloned out on request; readers
/// never alias live state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub mode: Mode,
    pub run_id: String,
    pub left: i64,
    pub right: i64,
    /// Latest bias-corrected IMU frame.
    pub imu: Imu,
    /// Action currently in effect.
    pub applied: Command,
    /// Most recent suggestion from the policy service, verbatim.
    pub last_suggested: Option<String>,
    pub bias: GyroBias,
    pub calibrating: bool,
}

/// The state machine driving one robot against one policy service.
pub struct Controller<R: Robot, P: Policy> {
    robot: Arc<R>,
    policy: P,
    clock: Arc<dyn Clock + Send + Sync>,
    timeouts: Timeouts,
    calibration: CalibrationCfg,
    dispatcher: Dispatcher,
    mode: Mode,
    run_id: String,
    sample: TelemetrySample,
    corrected: Imu,
    bias: GyroBias,
    applied: Command,
    last_suggested: Option<String>,
}

impl<R: Robot, P: Policy> Controller<R, P> {
    /// Build an idle controller. Starts in manual mode with `stop`
    /// applied: no autonomous motion until the operator opts in.
    pub fn new(
        robot: Arc<R>,
        policy: P,
        clock: Arc<dyn Clock + Send + Sync>,
        timeouts: Timeouts,
        calibration: CalibrationCfg,
    ) -> Self {
        let run_id = session::new_run_id(clock.epoch_ms());
        Self {
            robot,
            policy,
            clock,
            timeouts,
            calibration,
            dispatcher: Dispatcher::new(),
            mode: Mode::Manual,
            run_id,
            sample: TelemetrySample::default(),
            corrected: Imu::new(),
            bias: GyroBias::default(),
            applied: Command::Stop,
            last_suggested: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn applied(&self) -> Command {
        self.applied
    }

    pub fn bias(&self) -> GyroBias {
        self.bias
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// One full cycle. Never errors: every failure mode degrades to a
    /// logged outcome and, in auto mode, a forced stop.
    pub fn step(&mut self) -> CycleOutcome {
        let timeout = Duration::from_millis(self.timeouts.device_ms);

        // 1) Acquire. Each surface falls back to its prior value
        // independently; only a total failure aborts the cycle.
        let mut fresh = false;
        match self.robot.read_counts(timeout) {
            Ok((left, right)) => {
                self.sample.left = left;
                self.sample.right = right;
                fresh = true;
            }
            Err(e) => tracing::debug!(error = %e, "counts read failed; keeping previous"),
        }
        match self.robot.read_imu(timeout) {
            Ok(frame) => {
                self.sample.imu = frame;
                fresh = true;
            }
            Err(e) => tracing::debug!(error = %e, "imu read failed; keeping previous frame"),
        }
        if !fresh {
            if self.mode == Mode::Auto {
                tracing::warn!("telemetry unavailable; forcing stop");
                self.safety_stop();
            }
            return CycleOutcome::AcquireFailed;
        }

        // 2) Correct the freshest sample with the session bias.
        self.corrected = bias::correct(&self.sample.imu, &self.bias);

        // 3) Report & decide. The payload carries the action currently in
        // effect, not the one about to be chosen.
        let payload = SyncPayload {
            timestamp_ms: self.clock.epoch_ms(),
            run_id: self.run_id.clone(),
            imu: self.corrected.clone(),
            left: self.sample.left,
            right: self.sample.right,
            action: self.applied,
            mode: self.mode,
        };
        let suggestion = match self.policy.decide(&payload) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "policy sync failed");
                if self.mode == Mode::Auto {
                    self.safety_stop();
                }
                return CycleOutcome::SyncFailed;
            }
        };
        self.last_suggested = suggestion.clone();

        // 4) Act — auto mode only. A manual-mode suggestion is recorded
        // for display and goes no further.
        if self.mode != Mode::Auto {
            return CycleOutcome::NoChange;
        }
        let Some(raw) = suggestion else {
            return CycleOutcome::NoChange;
        };
        let Some(cmd) = Command::parse(&raw) else {
            // Unknown suggestions are a benign "no change", not an error.
            tracing::debug!(suggestion = %raw, "suggestion outside command set; ignored");
            return CycleOutcome::NoChange;
        };
        if self.dispatcher.send(&*self.robot, cmd) {
            self.applied = cmd;
            tracing::info!(action = %cmd, "applied remote action");
            CycleOutcome::Dispatched(cmd)
        } else {
            CycleOutcome::NoChange
        }
    }

    /// Manual press-and-hold start: apply and dispatch immediately.
    /// Ignored outside manual mode.
    pub fn press_start(&mut self, cmd: Command) {
        if self.mode != Mode::Manual {
            tracing::debug!(action = %cmd, "press ignored outside manual mode");
            return;
        }
        self.dispatcher.force(&*self.robot, cmd);
        self.applied = cmd;
        tracing::info!(action = %cmd, "manual press");
    }

    /// Manual release or cancel: always reverts to `stop`.
    pub fn press_end(&mut self) {
        if self.mode != Mode::Manual {
            return;
        }
        self.dispatcher.force(&*self.robot, Command::Stop);
        self.applied = Command::Stop;
        tracing::info!("manual release");
    }

    /// Switch control mode. Entering manual forces an unconditional stop,
    /// independent of anything else in flight.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        tracing::info!(mode = %mode, "mode change");
        if mode == Mode::Manual {
            self.safety_stop();
        }
    }

    /// Regenerate the session tag. Motion state is untouched.
    pub fn new_run(&mut self) -> &str {
        self.run_id = session::new_run_id(self.clock.epoch_ms());
        tracing::info!(run_id = %self.run_id, "new run");
        &self.run_id
    }

    /// Operator stop: unconditional, any mode.
    pub fn stop_now(&mut self) {
        self.safety_stop();
    }

    /// Run the blocking bias calibration against the device. The caller
    /// guards re-entry; the robot must stay stationary throughout.
    pub fn calibrate(&mut self) -> CalibrationReport {
        let timeout = Duration::from_millis(self.timeouts.device_ms);
        let report = bias::estimate(
            &*self.robot,
            &*self.clock,
            &self.calibration,
            timeout,
            self.bias,
        );
        self.bias = report.bias;
        tracing::info!(
            collected = report.collected,
            requested = report.requested,
            gx = report.bias.gx,
            gy = report.bias.gy,
            gz = report.bias.gz,
            "calibration finished"
        );
        report
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            run_id: self.run_id.clone(),
            left: self.sample.left,
            right: self.sample.right,
            imu: self.corrected.clone(),
            applied: self.applied,
            last_suggested: self.last_suggested.clone(),
            bias: self.bias,
            calibrating: false,
        }
    }

    fn safety_stop(&mut self) {
        self.dispatcher.force(&*self.robot, Command::Stop);
        self.applied = Command::Stop;
    }
}
