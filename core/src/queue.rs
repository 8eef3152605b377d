use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use batchq_utils_rs::collections::{BlockingQueueHandle, BlockingQueueReader, Element, QueueBase};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::QueueConfig;
use crate::error::StartError;
use crate::listener::BatchListenerHandle;
use crate::poller::{BatchPoller, PollerState, PollerStats, PollerStatus};
use crate::sender::QueueSender;
use crate::store::create_store;

#[cfg(test)]
mod tests;

/// How [`BatchQueue::stop`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
  /// The poller delivered its pending batch and exited within the grace period.
  Graceful,
  /// The poller was aborted; its pending batch is lost.
  Forced,
  /// No poller was running.
  NotRunning,
}

/// A batching queue: one backing store, any number of senders and at most one poller.
///
/// ## Lifecycle
/// `start` spawns the poller on the current tokio runtime. `stop` interrupts it, waits up to
/// the configured shutdown grace and then closes the store, discarding anything still buffered.
/// Stopping a queue that was never started closes its store too.
/// Producers blocked in `send` are not woken by `stop`; they run into their own enqueue timeout.
/// Dropping the queue closes the store, so outstanding senders get `SendError::Closed`, and
/// aborts a running poller without waiting.
pub struct BatchQueue<E: Element> {
  config: Arc<QueueConfig>,
  store: BlockingQueueHandle<E>,
  status: Arc<PollerStatus>,
  stop_requested: Arc<AtomicBool>,
  started: AtomicBool,
  poller: Mutex<Option<JoinHandle<()>>>,
}

impl<E: Element> BatchQueue<E> {
  pub fn new(config: QueueConfig) -> Self {
    let store = create_store(&config);
    Self {
      config: Arc::new(config),
      store,
      status: Arc::new(PollerStatus::new()),
      stop_requested: Arc::new(AtomicBool::new(false)),
      started: AtomicBool::new(false),
      poller: Mutex::new(None),
    }
  }

  pub fn name(&self) -> &str {
    self.config.name()
  }

  pub fn config(&self) -> &QueueConfig {
    &self.config
  }

  pub fn sender(&self) -> QueueSender<E> {
    QueueSender::new(self.config.clone(), self.store.clone())
  }

  /// Items currently held by the store.
  pub async fn len(&self) -> usize {
    self.store.len().await.to_usize()
  }

  pub async fn is_empty(&self) -> bool {
    self.store.is_empty().await
  }

  pub fn is_started(&self) -> bool {
    self.started.load(Ordering::SeqCst)
  }

  pub fn poller_state(&self) -> PollerState {
    self.status.state()
  }

  pub fn stats(&self) -> PollerStats {
    self.status.snapshot()
  }

  /// Spawns the poller delivering batches to `listener`. A queue can be started once.
  pub async fn start(&self, listener: BatchListenerHandle<E>) -> Result<(), StartError> {
    let runtime = Handle::try_current().map_err(|source| StartError::NoRuntime {
      queue: self.name().to_string(),
      source,
    })?;
    let mut poller = self.poller.lock().await;
    if self
      .started
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return Err(StartError::AlreadyStarted(self.name().to_string()));
    }

    let task = BatchPoller::new(
      self.config.clone(),
      self.store.clone(),
      listener,
      self.status.clone(),
      self.stop_requested.clone(),
    );
    *poller = Some(runtime.spawn(task.run()));
    tracing::info!(
      queue = %self.name(),
      store = %self.config.store_kind(),
      batch_size = self.config.batch_size(),
      "queue started"
    );
    Ok(())
  }

  pub async fn stop(&self) -> ShutdownOutcome {
    let Some(mut task) = self.poller.lock().await.take() else {
      self.release_store().await;
      return ShutdownOutcome::NotRunning;
    };
    self.stop_requested.store(true, Ordering::SeqCst);
    self.store.interrupt();

    let grace = self.config.shutdown_grace();
    let outcome = match tokio::time::timeout(grace, &mut task).await {
      Ok(Ok(())) => ShutdownOutcome::Graceful,
      Ok(Err(err)) => {
        tracing::error!(queue = %self.name(), error = %err, "poller task failed");
        ShutdownOutcome::Forced
      }
      Err(_) => {
        tracing::warn!(queue = %self.name(), ?grace, "poller did not stop in time, aborting");
        task.abort();
        let _ = task.await;
        ShutdownOutcome::Forced
      }
    };
    self.status.set_state(PollerState::Stopped);
    self.release_store().await;
    tracing::info!(queue = %self.name(), ?outcome, "queue stopped");
    outcome
  }

  async fn release_store(&self) {
    let discarded = self.store.clean_up().await;
    if discarded > 0 {
      tracing::warn!(queue = %self.name(), discarded, "discarded items left in the store");
    }
  }
}

impl<E: Element> Debug for BatchQueue<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BatchQueue")
      .field("config", &self.config)
      .field("started", &self.is_started())
      .field("state", &self.poller_state())
      .finish()
  }
}

impl<E: Element> Drop for BatchQueue<E> {
  fn drop(&mut self) {
    self.store.close();
    if let Some(task) = self.poller.get_mut().take() {
      self.stop_requested.store(true, Ordering::SeqCst);
      self.store.interrupt();
      task.abort();
    }
  }
}

static_assertions::assert_impl_all!(BatchQueue<u32>: Send, Sync);
