use std::time::Duration;

use batchq_utils_rs::collections::{Element, QueueSize};

use crate::config::{
  PropertySource, QueueConfig, QueueDefaults, StoreKind, DEFAULT_ARRAY_CAPACITY, MAX_ARRAY_CAPACITY, UNBOUNDED_CAPACITY,
};
use crate::config_option::ConfigOption;
use crate::error::ConfigError;
use crate::queue::BatchQueue;


/// Mutable draft of a [`QueueConfig`].
///
/// Values are kept loosely typed until [`QueueBuilder::build_config`] validates them, so
/// a builder can be cloned as a template and overridden per queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueBuilder {
  pub(crate) name: Option<String>,
  pub(crate) capacity: i64,
  pub(crate) batch_size: i64,
  pub(crate) poll_wait: Duration,
  pub(crate) enqueue_timeout: Duration,
  pub(crate) store_kind: StoreKind,
  pub(crate) try_transfer: bool,
  pub(crate) check_if_busy: bool,
  pub(crate) check_every: i64,
  pub(crate) shutdown_grace: Duration,
}

impl Default for QueueBuilder {
  fn default() -> Self {
    Self::new(QueueDefaults::default())
  }
}

impl From<Vec<ConfigOption>> for QueueBuilder {
  fn from(options: Vec<ConfigOption>) -> Self {
    QueueBuilder::default().with_options(options)
  }
}

impl QueueBuilder {
  pub fn new(defaults: QueueDefaults) -> Self {
    QueueBuilder {
      name: None,
      capacity: defaults.capacity,
      batch_size: defaults.batch_size,
      poll_wait: defaults.poll_wait,
      enqueue_timeout: defaults.enqueue_timeout,
      store_kind: defaults.store_kind,
      try_transfer: defaults.try_transfer,
      check_if_busy: defaults.check_if_busy,
      check_every: defaults.check_every,
      shutdown_grace: defaults.shutdown_grace,
    }
  }

  /// Seeds the defaults from `source`, falling back to `defaults` for absent keys.
  pub fn from_source<S: PropertySource>(source: &S, defaults: QueueDefaults) -> Self {
    Self::new(QueueDefaults::from_source(source, defaults))
  }

  pub fn with_options(mut self, options: impl IntoIterator<Item = ConfigOption>) -> Self {
    for option in options {
      option.apply(&mut self);
    }
    self
  }

  fn with_option(mut self, option: ConfigOption) -> Self {
    option.apply(&mut self);
    self
  }

  pub fn with_name(self, name: impl Into<String>) -> Self {
    self.with_option(ConfigOption::with_name(name))
  }

  /// `UNBOUNDED_CAPACITY` leaves the choice to the store kind.
  pub fn with_capacity(self, capacity: i64) -> Self {
    self.with_option(ConfigOption::with_capacity(capacity))
  }

  pub fn with_batch_size(self, batch_size: i64) -> Self {
    self.with_option(ConfigOption::with_batch_size(batch_size))
  }

  pub fn with_poll_wait(self, poll_wait: Duration) -> Self {
    self.with_option(ConfigOption::with_poll_wait(poll_wait))
  }

  pub fn with_enqueue_timeout(self, timeout: Duration) -> Self {
    self.with_option(ConfigOption::with_enqueue_timeout(timeout))
  }

  pub fn with_store_kind(self, store_kind: StoreKind) -> Self {
    self.with_option(ConfigOption::with_store_kind(store_kind))
  }

  pub fn with_try_transfer(self, try_transfer: bool) -> Self {
    self.with_option(ConfigOption::with_try_transfer(try_transfer))
  }

  pub fn with_check_if_busy(self, check_if_busy: bool) -> Self {
    self.with_option(ConfigOption::with_check_if_busy(check_if_busy))
  }

  /// Also enables busy checking.
  pub fn with_check_every(self, check_every: i64) -> Self {
    self.with_option(ConfigOption::with_check_every(check_every))
  }

  pub fn with_shutdown_grace(self, grace: Duration) -> Self {
    self.with_option(ConfigOption::with_shutdown_grace(grace))
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn capacity(&self) -> i64 {
    self.capacity
  }

  pub fn batch_size(&self) -> i64 {
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

  pub fn check_if_busy(&self) -> bool {
    self.check_if_busy
  }

  pub fn check_every(&self) -> i64 {
    self.check_every
  }

  pub fn shutdown_grace(&self) -> Duration {
    self.shutdown_grace
  }

  fn resolve_name(&self) -> Result<String, ConfigError> {
    match &self.name {
      Some(name) if name.trim().is_empty() => Err(ConfigError::EmptyName),
      Some(name) => Ok(name.clone()),
      None => Ok(format!("queue-{}", uuid::Uuid::new_v4())),
    }
  }

  fn resolve_capacity(&self) -> Result<QueueSize, ConfigError> {
    match self.store_kind {
      StoreKind::BoundedArray => match self.capacity {
        UNBOUNDED_CAPACITY => Ok(QueueSize::Limited(DEFAULT_ARRAY_CAPACITY)),
        n if n <= 0 => Err(ConfigError::InvalidCapacity(n)),
        n if n as u64 > MAX_ARRAY_CAPACITY as u64 => Err(ConfigError::CapacityTooLarge {
          requested: n,
          max: MAX_ARRAY_CAPACITY,
        }),
        n => Ok(QueueSize::Limited(n as usize)),
      },
      StoreKind::UnboundedLinked | StoreKind::SynchronousTransfer => Ok(QueueSize::Limitless),
    }
  }

  pub fn build_config(&self) -> Result<QueueConfig, ConfigError> {
    if self.batch_size < 1 {
      return Err(ConfigError::InvalidBatchSize(self.batch_size));
    }
    if self.check_if_busy && self.check_every < 1 {
      return Err(ConfigError::InvalidCheckEvery(self.check_every));
    }
    let name = self.resolve_name()?;
    let capacity = self.resolve_capacity()?;

    let mut batch_size = self.batch_size as usize;
    if let QueueSize::Limited(limit) = capacity {
      if batch_size > limit {
        tracing::warn!(queue = %name, batch_size, capacity = limit, "batch size exceeds capacity, clamping");
        batch_size = limit;
      }
    }

    Ok(QueueConfig {
      name,
      capacity,
      batch_size,
      poll_wait: self.poll_wait,
      enqueue_timeout: self.enqueue_timeout,
      store_kind: self.store_kind,
      try_transfer: self.try_transfer,
      check_if_busy: self.check_if_busy,
      check_every: self.check_every.max(1) as usize,
      shutdown_grace: self.shutdown_grace,
    })
  }

  pub fn build<E: Element>(&self) -> Result<BatchQueue<E>, ConfigError> {
    let config = self.build_config()?;
    tracing::debug!(
      queue = %config.name(),
      store = %config.store_kind(),
      capacity = ?config.capacity(),
      batch_size = config.batch_size(),
      "building queue"
    );
    Ok(BatchQueue::new(config))
  }
}
