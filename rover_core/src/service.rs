//! Message-driven ownership of the controller.
//!
//! One actor thread owns the [`Controller`]; everything else talks to it
//! through a crossbeam channel. A [`Ticker`] thread fires `Tick` at the
//! mode-defined period, and a tick that lands while a pass (or a
//! calibration) is in flight is dropped at fire time — never queued — so
//! at most one cycle is ever in flight.
//!
//! Out-of-band operations (press, mode switch, operator stop) dispatch an
//! immediate command through the shared gateway handle *and* enqueue the
//! state-reconciling message. The two paths may race an in-flight cycle;
//! the most recent dispatch wins, which is safe because device commands
//! are idempotent-in-effect.

use crate::bias::CalibrationCfg;
use crate::controller::{Controller, Snapshot, Timeouts};
use crossbeam_channel as xch;
use rover_traits::{Clock, Command, Mode, Policy, Robot};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Control messages accepted by the actor.
#[derive(Debug)]
pub enum Msg {
    Tick,
    PressStart(Command),
    PressEnd,
    SetMode(Mode),
    NewRun,
    Calibrate,
    StopNow,
    Shutdown,
}

/// Mode-dependent tick periods, milliseconds.
#[derive(Debug, Clone)]
pub struct ScheduleCfg {
    pub manual_tick_ms: u64,
    pub auto_tick_ms: u64,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            manual_tick_ms: 500,
            auto_tick_ms: 200,
        }
    }
}

impl ScheduleCfg {
    pub fn period_for(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Manual => self.manual_tick_ms,
            Mode::Auto => self.auto_tick_ms,
        }
    }
}

/// Slice length for the ticker's interruptible sleep, so shutdown stays
/// prompt even with long periods.
const SLEEP_SLICE_MS: u64 = 25;

/// The explicit schedule object: one thread firing `Tick` periodically.
///
/// The period is retunable at any time (mode changes); the `busy` guard
/// is consulted at fire time and a set guard drops the tick. The thread
/// is joined on drop.
pub struct Ticker {
    period_ms: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(
        tx: xch::Sender<Msg>,
        period_ms: u64,
        busy: Arc<AtomicBool>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let period = Arc::new(AtomicU64::new(period_ms.max(1)));
        let shutdown = Arc::new(AtomicBool::new(false));
        let period_t = period.clone();
        let shutdown_t = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            'ticker: loop {
                // Interruptible wait for one period; the period may be
                // retuned mid-wait and applies from the next interval.
                let wait_ms = period_t.load(Ordering::Relaxed);
                let start = clock.now();
                while clock.ms_since(start) < wait_ms {
                    if shutdown_t.load(Ordering::Relaxed) {
                        break 'ticker;
                    }
                    let remaining = wait_ms.saturating_sub(clock.ms_since(start));
                    clock.sleep(Duration::from_millis(remaining.min(SLEEP_SLICE_MS)));
                }
                if shutdown_t.load(Ordering::Relaxed) {
                    break;
                }
                if busy.load(Ordering::Relaxed) {
                    // A cycle is still in flight: drop this tick outright.
                    tracing::trace!("tick dropped; cycle in flight");
                    continue;
                }
                if tx.send(Msg::Tick).is_err() {
                    tracing::debug!("tick consumer disconnected, exiting ticker");
                    break;
                }
            }
            tracing::trace!("ticker thread exiting cleanly");
        });

        Self {
            period_ms: period,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Current firing period (ms).
    pub fn period_ms(&self) -> u64 {
        self.period_ms.load(Ordering::Relaxed)
    }

    /// Retune the firing period; effective from the next interval.
    pub fn set_period_ms(&self, ms: u64) {
        self.period_ms.store(ms.max(1), Ordering::Relaxed);
    }

    /// Shared handle to the period, for retuning from the actor thread.
    fn period_handle(&self) -> Arc<AtomicU64> {
        self.period_ms.clone()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("ticker thread panicked during shutdown");
        }
    }
}

/// Handle to the running sync loop.
///
/// Owns the actor and ticker threads; both are joined on drop, after the
/// actor leaves the device stopped.
pub struct SyncService<R: Robot + Send + Sync + 'static> {
    tx: xch::Sender<Msg>,
    robot: Arc<R>,
    calibrating: Arc<AtomicBool>,
    shared: Arc<Mutex<Snapshot>>,
    ticker: Ticker,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl<R: Robot + Send + Sync + 'static> SyncService<R> {
    pub fn spawn<P: Policy + Send + 'static>(
        robot: Arc<R>,
        policy: P,
        clock: Arc<dyn Clock + Send + Sync>,
        timeouts: Timeouts,
        calibration: CalibrationCfg,
        schedule: ScheduleCfg,
    ) -> Self {
        let (tx, rx) = xch::unbounded::<Msg>();
        let busy = Arc::new(AtomicBool::new(false));
        let calibrating = Arc::new(AtomicBool::new(false));

        let mut controller = Controller::new(
            robot.clone(),
            policy,
            clock.clone(),
            timeouts,
            calibration,
        );
        let shared = Arc::new(Mutex::new(controller.snapshot()));
        let ticker = Ticker::spawn(
            tx.clone(),
            schedule.period_for(controller.mode()),
            busy.clone(),
            clock,
        );

        let period = ticker.period_handle();
        let busy_actor = busy.clone();
        let calibrating_actor = calibrating.clone();
        let shared_actor = shared.clone();

        let join_handle = std::thread::spawn(move || {
            for msg in rx {
                match msg {
                    Msg::Shutdown => break,
                    Msg::Tick => {
                        busy_actor.store(true, Ordering::Relaxed);
                        let outcome = controller.step();
                        tracing::debug!(?outcome, "cycle finished");
                        busy_actor.store(false, Ordering::Relaxed);
                    }
                    Msg::PressStart(cmd) => controller.press_start(cmd),
                    Msg::PressEnd => controller.press_end(),
                    Msg::SetMode(mode) => {
                        controller.set_mode(mode);
                        period.store(schedule.period_for(mode).max(1), Ordering::Relaxed);
                    }
                    Msg::NewRun => {
                        controller.new_run();
                    }
                    Msg::Calibrate => {
                        // Ticks are dropped while busy, so the loop is
                        // effectively paused for the stillness window.
                        busy_actor.store(true, Ordering::Relaxed);
                        let _report = controller.calibrate();
                        busy_actor.store(false, Ordering::Relaxed);
                        calibrating_actor.store(false, Ordering::Relaxed);
                    }
                    Msg::StopNow => controller.stop_now(),
                }
                publish(
                    &shared_actor,
                    controller.snapshot(),
                    calibrating_actor.load(Ordering::Relaxed),
                );
            }
            // Leave the device stopped whatever state we were in.
            controller.stop_now();
            publish(&shared_actor, controller.snapshot(), false);
            tracing::debug!("sync actor exiting");
        });

        Self {
            tx,
            robot,
            calibrating,
            shared,
            ticker,
            join_handle: Some(join_handle),
        }
    }

    /// Latest published loop state.
    pub fn snapshot(&self) -> Snapshot {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current tick period (ms), mostly for tests and status output.
    pub fn tick_period_ms(&self) -> u64 {
        self.ticker.period_ms()
    }

    /// Manual press-and-hold start. Dispatches out-of-band when the loop
    /// is in manual mode, then reconciles state through the actor.
    pub fn press_start(&self, cmd: Command) {
        if self.snapshot().mode == Mode::Manual {
            self.dispatch_oob(cmd);
        }
        self.send(Msg::PressStart(cmd));
    }

    /// Manual release or cancel: always comes back to `stop`.
    pub fn press_end(&self) {
        if self.snapshot().mode == Mode::Manual {
            self.dispatch_oob(Command::Stop);
        }
        self.send(Msg::PressEnd);
    }

    /// Switch control mode. Entering manual stops the robot immediately,
    /// without waiting for an in-flight cycle.
    pub fn set_mode(&self, mode: Mode) {
        if mode == Mode::Manual && self.snapshot().mode != Mode::Manual {
            self.dispatch_oob(Command::Stop);
        }
        self.send(Msg::SetMode(mode));
    }

    /// Regenerate the run id.
    pub fn new_run(&self) {
        self.send(Msg::NewRun);
    }

    /// Request a bias calibration. Returns false when one is already in
    /// progress: the redundant request is dropped, not queued.
    pub fn calibrate(&self) -> bool {
        if self.calibrating.swap(true, Ordering::SeqCst) {
            tracing::debug!("calibration already in progress; request dropped");
            return false;
        }
        // Reflect the in-progress flag immediately for observers.
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calibrating = true;
        if self.tx.send(Msg::Calibrate).is_err() {
            self.calibrating.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }

    pub fn calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Relaxed)
    }

    /// Operator stop: out-of-band dispatch plus state reconciliation.
    pub fn stop_now(&self) {
        self.dispatch_oob(Command::Stop);
        self.send(Msg::StopNow);
    }

    fn send(&self, msg: Msg) {
        if self.tx.send(msg).is_err() {
            tracing::warn!("sync actor is gone; message dropped");
        }
    }

    fn dispatch_oob(&self, cmd: Command) {
        if let Err(e) = self.robot.execute(cmd) {
            tracing::warn!(action = %cmd, error = %e, "out-of-band execute failed");
        }
    }
}

impl<R: Robot + Send + Sync + 'static> Drop for SyncService<R> {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("sync actor panicked during shutdown");
        }
        // `ticker` drops after this body and joins its own thread.
    }
}

fn publish(shared: &Mutex<Snapshot>, mut snap: Snapshot, calibrating: bool) {
    snap.calibrating = calibrating;
    *shared.lock().unwrap_or_else(PoisonError::into_inner) = snap;
}
