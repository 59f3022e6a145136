#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Transport implementations of the `rover_traits` seams.
//!
//! `HttpRobot` and `HttpPolicy` talk to the real endpoints over blocking
//! reqwest; `SimRobot` and `SimPolicy` fake both ends in-process for
//! development and tests.

pub mod device;
pub mod error;
pub mod policy;
pub mod sim;

pub use device::HttpRobot;
pub use error::{LinkError, Result};
pub use policy::HttpPolicy;
pub use sim::{SimPolicy, SimRobot};
