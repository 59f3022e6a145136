#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Transport-agnostic sync engine for a remotely supervised robot.
//!
//! All device and policy I/O goes through the `rover_traits::Robot` and
//! `rover_traits::Policy` seams; the engine itself never touches HTTP.
//!
//! ## Architecture
//!
//! - **Bias**: stationary gyro sampling and per-axis correction (`bias`)
//! - **Dispatch**: command dedupe with forced-stop bypass (`dispatch`)
//! - **Controller**: the acquire → correct → report → act state machine,
//!   one pass per tick, with the auto-mode safety-stop policy
//!   (`controller`)
//! - **Service**: the owning actor plus the retunable `Ticker`; ticks
//!   that land mid-cycle are dropped, overrides dispatch out-of-band
//!   (`service`)
//! - **Session**: opaque run-id tags for the logging stream (`session`)
//!
//! ## Failure policy
//!
//! Nothing in this crate is fatal. Transient I/O failures log, force a
//! stop in auto mode, and the loop keeps ticking; malformed data falls
//! back to the previous known value; unknown policy suggestions are a
//! benign no-op; redundant ticks and calibration requests are dropped.

// Module declarations
pub mod bias;
pub mod controller;
mod conversions;
pub mod dispatch;
pub mod error;
pub mod mocks;
pub mod service;
pub mod session;
pub mod telemetry;

pub use bias::{CalibrationCfg, CalibrationReport, GyroBias, correct};
pub use controller::{Controller, CycleOutcome, Snapshot, Timeouts};
pub use dispatch::Dispatcher;
pub use error::{Result, SyncError};
pub use service::{Msg, ScheduleCfg, SyncService, Ticker};
pub use telemetry::TelemetrySample;
