//! Run/session identifiers.
//!
//! A run id tags the payloads of one data-collection period. It is an
//! opaque string with no control-flow meaning; regenerating it mid-drive
//! is always safe.

use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Build a fresh run id from the wall clock plus a process-local counter,
/// so rapid regeneration within one millisecond still yields unique tags.
pub fn new_run_id(epoch_ms: i64) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("run-{epoch_ms:x}-{n:02x}")
}
