//! Queue configuration: defaults, the validated [`QueueConfig`] and the store selector.

use std::time::Duration;

use batchq_utils_rs::collections::QueueSize;
use strum::{Display, EnumString};

mod property_source;

pub use self::property_source::*;

#[cfg(test)]
mod tests;

/// Capacity sentinel meaning "unbounded" or "not set yet".
pub const UNBOUNDED_CAPACITY: i64 = -1;
/// Capacity a bounded array store falls back to when none was given.
pub const DEFAULT_ARRAY_CAPACITY: usize = 100_000;
/// Largest capacity a bounded array store accepts. The ring is allocated up front.
pub const MAX_ARRAY_CAPACITY: usize = 1 << 24;

pub const DEFAULT_BATCH_SIZE: i64 = 1_000;
pub const DEFAULT_CAPACITY: i64 = 10_000;
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_millis(15);
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(1_000);
pub const DEFAULT_CHECK_EVERY: i64 = 100;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Selects the hand-off primitive behind a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StoreKind {
  /// Fixed-capacity circular buffer.
  #[default]
  #[strum(to_string = "array", serialize = "bounded_array")]
  BoundedArray,
  /// Unbounded linked FIFO.
  #[strum(to_string = "linked", serialize = "unbounded_linked")]
  UnboundedLinked,
  /// No buffering, producers hand items straight to the poller.
  #[strum(to_string = "transfer", serialize = "synchronous_transfer")]
  SynchronousTransfer,
}

/// Values a [`crate::QueueBuilder`] starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueDefaults {
  pub batch_size: i64,
  pub capacity: i64,
  pub poll_wait: Duration,
  pub enqueue_timeout: Duration,
  pub store_kind: StoreKind,
  pub try_transfer: bool,
  pub check_if_busy: bool,
  pub check_every: i64,
  pub shutdown_grace: Duration,
}

impl Default for QueueDefaults {
  fn default() -> Self {
    QueueDefaults {
      batch_size: DEFAULT_BATCH_SIZE,
      capacity: DEFAULT_CAPACITY,
      poll_wait: DEFAULT_POLL_WAIT,
      enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
      store_kind: StoreKind::BoundedArray,
      try_transfer: false,
      check_if_busy: false,
      check_every: DEFAULT_CHECK_EVERY,
      shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
    }
  }
}

impl QueueDefaults {
  /// Overlays every value found in `source` on top of `base`.
  pub fn from_source<S: PropertySource>(source: &S, base: QueueDefaults) -> Self {
    let millis = |key: &str, fallback: Duration| -> Duration {
      let value = source.get_integer(key, fallback.as_millis().min(i64::MAX as u128) as i64);
      Duration::from_millis(value.max(0) as u64)
    };
    QueueDefaults {
      batch_size: source.get_integer(KEY_BATCH_SIZE, base.batch_size),
      capacity: source.get_integer(KEY_SIZE, base.capacity),
      poll_wait: millis(KEY_POLL_WAIT_MS, base.poll_wait),
      enqueue_timeout: millis(KEY_ENQUEUE_TIMEOUT_MS, base.enqueue_timeout),
      store_kind: source.get_typed(KEY_STORE_KIND, base.store_kind),
      try_transfer: source.get_boolean(KEY_TRY_TRANSFER, base.try_transfer),
      check_if_busy: source.get_boolean(KEY_CHECK_IF_BUSY, base.check_if_busy),
      check_every: source.get_integer(KEY_CHECK_EVERY, base.check_every),
      shutdown_grace: millis(KEY_SHUTDOWN_GRACE_MS, base.shutdown_grace),
    }
  }
}

/// Validated, immutable queue settings. Only [`crate::QueueBuilder`] creates one.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
  pub(crate) name: String,
  pub(crate) capacity: QueueSize,
  pub(crate) batch_size: usize,
  pub(crate) poll_wait: Duration,
  pub(crate) enqueue_timeout: Duration,
  pub(crate) store_kind: StoreKind,
  pub(crate) try_transfer: bool,
  pub(crate) check_if_busy: bool,
  pub(crate) check_every: usize,
  pub(crate) shutdown_grace: Duration,
}

impl QueueConfig {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// `Limitless` for the linked and transfer stores.
  pub fn capacity(&self) -> QueueSize {
    self.capacity
  }

  pub fn batch_size(&self) -> usize {
    self.batch_size
  }

  pub fn poll_wait(&self) -> Duration {
    self.poll_wait
  }

  pub fn enqueue_timeout(&self) -> Duration {
    self.enqueue_timeout
  }

  pub fn store_kind(&self) -> StoreKind {
    self.store_kind
  }

  pub fn try_transfer(&self) -> bool {
    self.try_transfer
  }

  /// Whether senders attempt an immediate hand-off before the timed enqueue.
  pub fn uses_transfer(&self) -> bool {
    self.try_transfer && self.store_kind == StoreKind::SynchronousTransfer
  }

  pub fn check_if_busy(&self) -> bool {
    self.check_if_busy
  }

  pub fn check_every(&self) -> usize {
    self.check_every
  }

  pub fn shutdown_grace(&self) -> Duration {
    self.shutdown_grace
  }
}
