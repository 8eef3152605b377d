use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use batchq_utils_rs::collections::{BlockingQueueHandle, BlockingQueueWriter, Element, PutError};

use crate::config::QueueConfig;
use crate::error::SendError;

#[cfg(test)]
mod tests;

/// Producer side of a [`crate::BatchQueue`]. Cheap to clone and shareable across tasks.
pub struct QueueSender<E> {
  config: Arc<QueueConfig>,
  store: BlockingQueueHandle<E>,
}

impl<E: Element> QueueSender<E> {
  pub(crate) fn new(config: Arc<QueueConfig>, store: BlockingQueueHandle<E>) -> Self {
    Self { config, store }
  }

  pub fn queue_name(&self) -> &str {
    self.config.name()
  }

  /// Enqueues one element, waiting at most the configured enqueue timeout.
  ///
  /// A `Timeout` error is backpressure: the element is handed back and nothing is retried.
  pub async fn send(&self, element: E) -> Result<(), SendError<E>> {
    let element = if self.config.uses_transfer() {
      match self.store.try_transfer(element).await {
        Ok(()) => return Ok(()),
        Err(PutError::TimeoutError(element)) => element,
        Err(err) => return Err(self.map_error(err)),
      }
    } else {
      element
    };

    self
      .store
      .try_put(element, self.config.enqueue_timeout())
      .await
      .map_err(|err| self.map_error(err))
  }

  /// Sends the elements in order and stops at the first rejection.
  pub async fn send_all<I>(&self, elements: I) -> Result<(), SendError<E>>
  where
    I: IntoIterator<Item = E>, {
    for element in elements {
      self.send(element).await?;
    }
    Ok(())
  }

  fn map_error(&self, err: PutError<E>) -> SendError<E> {
    let queue = self.config.name().to_string();
    match err {
      PutError::TimeoutError(element) => {
        tracing::debug!(queue = %queue, timeout = ?self.config.enqueue_timeout(), "enqueue timed out");
        SendError::Timeout {
          queue,
          timeout: self.config.enqueue_timeout(),
          element,
        }
      }
      PutError::OfferError(element) => SendError::Closed { queue, element },
    }
  }
}

impl<E> Clone for QueueSender<E> {
  fn clone(&self) -> Self {
    Self {
      config: self.config.clone(),
      store: self.store.clone(),
    }
  }
}

impl<E> Debug for QueueSender<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueueSender")
      .field("queue", &self.config.name())
      .finish()
  }
}

static_assertions::assert_impl_all!(QueueSender<u32>: Send, Sync, Clone);
