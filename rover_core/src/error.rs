use thiserror::Error;

/// Typed failures surfaced by the sync loop.
///
/// None of these are fatal to the loop itself: the controller recovers
/// locally (retained samples, forced safety stops) and keeps ticking.
/// They exist so callers outside the loop (CLI one-shots, self-check)
/// can report precisely what went wrong.
#[derive(Debug, Error, Clone)]
pub enum SyncError {
    #[error("device unavailable: {0}")]
    Device(String),
    #[error("policy sync failed: {0}")]
    Policy(String),
    #[error("invalid state: {0}")]
    State(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
