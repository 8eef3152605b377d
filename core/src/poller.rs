use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use batchq_utils_rs::collections::{BlockingQueueHandle, BlockingQueueReader, Element, QueueBase, QueueError};
use futures::FutureExt;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::Display;

use crate::config::QueueConfig;
use crate::error::ListenerError;
use crate::listener::{BatchListener, BatchListenerHandle};

mod busy_detector;

pub use self::busy_detector::{BUSY_HIGH_WATER, BUSY_LOW_WATER, BUSY_POLL_WAIT};
use self::busy_detector::{effective_poll_wait, BusyDetector};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Display)]
#[repr(u8)]
pub enum PollerState {
  /// Normal timing, waits up to `poll_wait` per attempt.
  Resting = 0,
  /// Dense arrivals, waits at most `BUSY_POLL_WAIT` per attempt.
  Busy = 1,
  Stopped = 2,
}

/// Point-in-time counters of a poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
  pub attempts: u64,
  pub items: u64,
  pub batches: u64,
  pub listener_failures: u64,
  pub busy_transitions: u64,
  pub resting_transitions: u64,
}

/// State and counters shared between a poller task and its queue.
#[derive(Debug)]
pub(crate) struct PollerStatus {
  state: AtomicU8,
  attempts: AtomicU64,
  items: AtomicU64,
  batches: AtomicU64,
  listener_failures: AtomicU64,
  busy_transitions: AtomicU64,
  resting_transitions: AtomicU64,
}

impl PollerStatus {
  pub(crate) fn new() -> Self {
    Self {
      state: AtomicU8::new(PollerState::Resting.into()),
      attempts: AtomicU64::new(0),
      items: AtomicU64::new(0),
      batches: AtomicU64::new(0),
      listener_failures: AtomicU64::new(0),
      busy_transitions: AtomicU64::new(0),
      resting_transitions: AtomicU64::new(0),
    }
  }

  pub(crate) fn state(&self) -> PollerState {
    PollerState::try_from(self.state.load(Ordering::SeqCst)).unwrap_or(PollerState::Stopped)
  }

  pub(crate) fn set_state(&self, state: PollerState) {
    self.state.store(state.into(), Ordering::SeqCst);
  }

  pub(crate) fn snapshot(&self) -> PollerStats {
    PollerStats {
      attempts: self.attempts.load(Ordering::Relaxed),
      items: self.items.load(Ordering::Relaxed),
      batches: self.batches.load(Ordering::Relaxed),
      listener_failures: self.listener_failures.load(Ordering::Relaxed),
      busy_transitions: self.busy_transitions.load(Ordering::Relaxed),
      resting_transitions: self.resting_transitions.load(Ordering::Relaxed),
    }
  }

  fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }
}

/// The single consumer loop of a queue.
pub(crate) struct BatchPoller<E: Element> {
  config: Arc<QueueConfig>,
  store: BlockingQueueHandle<E>,
  listener: BatchListenerHandle<E>,
  status: Arc<PollerStatus>,
  stop: Arc<AtomicBool>,
}

impl<E: Element> BatchPoller<E> {
  pub(crate) fn new(
    config: Arc<QueueConfig>,
    store: BlockingQueueHandle<E>,
    listener: BatchListenerHandle<E>,
    status: Arc<PollerStatus>,
    stop: Arc<AtomicBool>,
  ) -> Self {
    Self {
      config,
      store,
      listener,
      status,
      stop,
    }
  }

  pub(crate) async fn run(self) {
    let queue = self.config.name().to_string();
    let batch_size = self.config.batch_size();
    let mut batch: Vec<E> = Vec::with_capacity(batch_size.min(1024));
    let mut detector = self
      .config
      .check_if_busy()
      .then(|| BusyDetector::new(self.config.check_every()));

    tracing::debug!(queue = %queue, batch_size, "poller started");
    loop {
      if self.stop.load(Ordering::SeqCst) {
        break;
      }
      let state = self.status.state();
      let wait = effective_poll_wait(state, self.config.poll_wait());
      PollerStatus::increment(&self.status.attempts);

      let hit = match self.store.try_take(wait).await {
        Ok(Some(element)) => {
          PollerStatus::increment(&self.status.items);
          batch.push(element);
          if batch.len() >= batch_size {
            self.deliver(std::mem::take(&mut batch)).await;
          }
          true
        }
        Ok(None) => {
          if !batch.is_empty() {
            self.deliver(std::mem::take(&mut batch)).await;
          } else if state == PollerState::Resting {
            self.run_hook("idle", self.listener.idle()).await;
          }
          false
        }
        Err(QueueError::InterruptedError) => {
          tracing::debug!(queue = %queue, "poller interrupted");
          break;
        }
        Err(QueueError::PoolError) => {
          tracing::debug!(queue = %queue, "store closed under the poller");
          break;
        }
      };

      if let Some(detector) = detector.as_mut() {
        if detector.record(hit) {
          let backlog_saturated = self.store.len().await.to_usize() >= batch_size;
          let density = detector.finish_window(backlog_saturated);
          self.transition(&queue, state, BusyDetector::next_state(state, density), density);
        }
      }
    }

    if !batch.is_empty() {
      self.deliver(std::mem::take(&mut batch)).await;
    }
    self.run_hook("shutdown", self.listener.shutdown()).await;
    self.status.set_state(PollerState::Stopped);
    tracing::debug!(queue = %queue, stats = ?self.status.snapshot(), "poller stopped");
  }

  fn transition(&self, queue: &str, from: PollerState, to: PollerState, density: f64) {
    if from == to {
      return;
    }
    self.status.set_state(to);
    match to {
      PollerState::Busy => PollerStatus::increment(&self.status.busy_transitions),
      PollerState::Resting => PollerStatus::increment(&self.status.resting_transitions),
      PollerState::Stopped => {}
    }
    tracing::debug!(queue = %queue, %from, %to, density, "poller timing changed");
  }

  async fn deliver(&self, batch: Vec<E>) {
    let size = batch.len();
    let outcome = AssertUnwindSafe(self.listener.receive(batch)).catch_unwind().await;
    PollerStatus::increment(&self.status.batches);
    let error = match outcome {
      Ok(Ok(())) => return,
      Ok(Err(error)) => error,
      Err(panic) => ListenerError::Panicked(panic_message(panic.as_ref())),
    };

    PollerStatus::increment(&self.status.listener_failures);
    tracing::warn!(queue = %self.config.name(), size, error = %error, "listener failed to process batch");
    if AssertUnwindSafe(self.listener.report_error(error))
      .catch_unwind()
      .await
      .is_err()
    {
      tracing::error!(queue = %self.config.name(), "listener panicked while reporting an error");
    }
  }

  /// Runs a listener hook so that a panic inside it leaves the loop alive.
  async fn run_hook<F>(&self, hook: &'static str, future: F)
  where
    F: Future<Output = ()>, {
    if let Err(panic) = AssertUnwindSafe(future).catch_unwind().await {
      PollerStatus::increment(&self.status.listener_failures);
      tracing::error!(
        queue = %self.config.name(),
        hook,
        error = %panic_message(panic.as_ref()),
        "listener hook panicked"
      );
    }
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(message) = panic.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
