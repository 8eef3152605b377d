use std::time::Duration;

use crate::poller::PollerState;

/// Density at or above which the poller switches to busy timing.
pub const BUSY_HIGH_WATER: f64 = 0.75;
/// Density at or below which the poller falls back to resting timing.
pub const BUSY_LOW_WATER: f64 = 0.25;
/// Upper bound on the per-poll wait while busy.
pub const BUSY_POLL_WAIT: Duration = Duration::from_millis(1);

/// Samples poll outcomes over windows of `check_every` attempts.
#[derive(Debug, Clone)]
pub(crate) struct BusyDetector {
  check_every: usize,
  attempts: usize,
  hits: usize,
}

impl BusyDetector {
  pub(crate) fn new(check_every: usize) -> Self {
    Self {
      check_every: check_every.max(1),
      attempts: 0,
      hits: 0,
    }
  }

  /// Records one poll attempt. Returns `true` when the window is complete.
  pub(crate) fn record(&mut self, hit: bool) -> bool {
    self.attempts += 1;
    if hit {
      self.hits += 1;
    }
    self.attempts >= self.check_every
  }

  /// Closes the current window and returns its density.
  ///
  /// A backlog of at least one full batch counts as fully dense regardless of the hit ratio.
  pub(crate) fn finish_window(&mut self, backlog_saturated: bool) -> f64 {
    let density = match (backlog_saturated, self.attempts) {
      (true, _) => 1.0,
      (false, 0) => 0.0,
      (false, attempts) => self.hits as f64 / attempts as f64,
    };
    self.attempts = 0;
    self.hits = 0;
    density
  }

  pub(crate) fn next_state(current: PollerState, density: f64) -> PollerState {
    if current == PollerState::Stopped {
      return current;
    }
    if density >= BUSY_HIGH_WATER {
      PollerState::Busy
    } else if density <= BUSY_LOW_WATER {
      PollerState::Resting
    } else {
      current
    }
  }
}

pub(crate) fn effective_poll_wait(state: PollerState, poll_wait: Duration) -> Duration {
  match state {
    PollerState::Busy => poll_wait.min(BUSY_POLL_WAIT),
    PollerState::Resting | PollerState::Stopped => poll_wait,
  }
}
