//! Command dedupe and dispatch.

use rover_traits::{Command, Robot};

/// Deduplicating dispatcher over the device gateway.
///
/// `send` suppresses a command equal to the last one sent, keeping at
/// most one command "in effect" without chatter; `force` always goes out
/// (safety stops, manual overrides, mode transitions).
///
/// Dispatch is fire-and-forget: a failed `execute` is logged, never
/// propagated, because a momentary send failure must not take down the
/// loop — the next cycle's safety logic recovers.
#[derive(Debug, Default)]
pub struct Dispatcher {
    last_sent: Option<Command>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently dispatched command, if any.
    pub fn last_sent(&self) -> Option<Command> {
        self.last_sent
    }

    /// Dispatch unless `cmd` equals the last sent command.
    /// Returns whether the command actually went out.
    pub fn send<R: Robot + ?Sized>(&mut self, robot: &R, cmd: Command) -> bool {
        if self.last_sent == Some(cmd) {
            tracing::trace!(action = %cmd, "already in effect; dedupe");
            return false;
        }
        self.force(robot, cmd);
        true
    }

    /// Dispatch unconditionally and record it as the dedupe baseline.
    pub fn force<R: Robot + ?Sized>(&mut self, robot: &R, cmd: Command) {
        if let Err(e) = robot.execute(cmd) {
            tracing::warn!(action = %cmd, error = %e, "execute failed; next cycle recovers");
        }
        self.last_sent = Some(cmd);
    }
}
