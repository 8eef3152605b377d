use std::time::Duration;

use crate::builder::QueueBuilder;
use crate::config::{StoreKind, DEFAULT_ARRAY_CAPACITY, UNBOUNDED_CAPACITY};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOption {
  SetName(String),
  SetCapacity(i64),
  SetBatchSize(i64),
  SetPollWait(Duration),
  SetEnqueueTimeout(Duration),
  SetStoreKind(StoreKind),
  SetTryTransfer(bool),
  SetCheckIfBusy(bool),
  SetCheckEvery(i64),
  SetShutdownGrace(Duration),
}

impl ConfigOption {
  pub fn apply(&self, builder: &mut QueueBuilder) {
    match self {
      ConfigOption::SetName(name) => {
        builder.name = Some(name.clone());
      }
      ConfigOption::SetCapacity(capacity) => {
        builder.capacity = *capacity;
      }
      ConfigOption::SetBatchSize(batch_size) => {
        builder.batch_size = *batch_size;
      }
      ConfigOption::SetPollWait(poll_wait) => {
        builder.poll_wait = *poll_wait;
      }
      ConfigOption::SetEnqueueTimeout(timeout) => {
        builder.enqueue_timeout = *timeout;
      }
      ConfigOption::SetStoreKind(store_kind) => {
        builder.store_kind = *store_kind;
        match store_kind {
          StoreKind::BoundedArray if builder.capacity == UNBOUNDED_CAPACITY => {
            builder.capacity = DEFAULT_ARRAY_CAPACITY as i64;
          }
          StoreKind::BoundedArray => {}
          StoreKind::UnboundedLinked | StoreKind::SynchronousTransfer => {
            builder.capacity = UNBOUNDED_CAPACITY;
          }
        }
      }
      ConfigOption::SetTryTransfer(try_transfer) => {
        builder.try_transfer = *try_transfer;
      }
      ConfigOption::SetCheckIfBusy(check_if_busy) => {
        builder.check_if_busy = *check_if_busy;
      }
      ConfigOption::SetCheckEvery(check_every) => {
        // Choosing a sampling interval implies busy checking.
        builder.check_every = *check_every;
        builder.check_if_busy = true;
      }
      ConfigOption::SetShutdownGrace(grace) => {
        builder.shutdown_grace = *grace;
      }
    }
  }

  pub fn with_name(name: impl Into<String>) -> ConfigOption {
    ConfigOption::SetName(name.into())
  }

  pub fn with_capacity(capacity: i64) -> ConfigOption {
    ConfigOption::SetCapacity(capacity)
  }

  pub fn with_batch_size(batch_size: i64) -> ConfigOption {
    ConfigOption::SetBatchSize(batch_size)
  }

  pub fn with_poll_wait(poll_wait: Duration) -> ConfigOption {
    ConfigOption::SetPollWait(poll_wait)
  }

  pub fn with_enqueue_timeout(timeout: Duration) -> ConfigOption {
    ConfigOption::SetEnqueueTimeout(timeout)
  }

  pub fn with_store_kind(store_kind: StoreKind) -> ConfigOption {
    ConfigOption::SetStoreKind(store_kind)
  }

  pub fn with_try_transfer(try_transfer: bool) -> ConfigOption {
    ConfigOption::SetTryTransfer(try_transfer)
  }

  pub fn with_check_if_busy(check_if_busy: bool) -> ConfigOption {
    ConfigOption::SetCheckIfBusy(check_if_busy)
  }

  pub fn with_check_every(check_every: i64) -> ConfigOption {
    ConfigOption::SetCheckEvery(check_every)
  }

  pub fn with_shutdown_grace(grace: Duration) -> ConfigOption {
    ConfigOption::SetShutdownGrace(grace)
  }
}
