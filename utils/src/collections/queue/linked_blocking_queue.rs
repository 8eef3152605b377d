use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::collections::element::Element;
use crate::collections::{BlockingQueueReader, BlockingQueueWriter, PutError, QueueBase, QueueError, QueueSize};
use async_trait::async_trait;
use tokio::sync::mpsc::error::{SendError, TryRecvError};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time;

#[cfg(test)]
mod tests;

#[derive(Debug)]
struct LinkedBlockingQueueInner<E> {
  receiver: Mutex<mpsc::UnboundedReceiver<E>>,
  count: AtomicUsize,
  is_closed: AtomicBool,
  interrupt: Notify,
  interrupted: AtomicBool,
}

/// An unbounded FIFO queue on top of an unbounded mpsc channel.
///
/// Puts never wait for space. Takes are serialized on the receiver, so the queue is meant
/// for a single consumer.
pub struct LinkedBlockingQueue<E> {
  sender: mpsc::UnboundedSender<E>,
  inner: Arc<LinkedBlockingQueueInner<E>>,
}

impl<E> LinkedBlockingQueue<E> {
  pub fn new() -> Self {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      sender,
      inner: Arc::new(LinkedBlockingQueueInner {
        receiver: Mutex::new(receiver),
        count: AtomicUsize::new(0),
        is_closed: AtomicBool::new(false),
        interrupt: Notify::new(),
        interrupted: AtomicBool::new(false),
      }),
    }
  }

  fn decrement_count(&self) {
    let _ = self
      .inner
      .count
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some(c.saturating_sub(1)));
  }
}

impl<E> Default for LinkedBlockingQueue<E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E> Clone for LinkedBlockingQueue<E> {
  fn clone(&self) -> Self {
    Self {
      sender: self.sender.clone(),
      inner: self.inner.clone(),
    }
  }
}

impl<E> Debug for LinkedBlockingQueue<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LinkedBlockingQueue")
      .field("count", &self.inner.count.load(Ordering::Relaxed))
      .field("is_closed", &self.inner.is_closed.load(Ordering::Relaxed))
      .finish()
  }
}

#[async_trait]
impl<E: Element> QueueBase<E> for LinkedBlockingQueue<E> {
  async fn len(&self) -> QueueSize {
    QueueSize::Limited(self.inner.count.load(Ordering::SeqCst))
  }

  async fn capacity(&self) -> QueueSize {
    QueueSize::Limitless
  }
}

#[async_trait]
impl<E: Element> BlockingQueueWriter<E> for LinkedBlockingQueue<E> {
  async fn try_put(&self, element: E, _timeout: Duration) -> Result<(), PutError<E>> {
    if self.is_closed() {
      return Err(PutError::OfferError(element));
    }
    self.inner.count.fetch_add(1, Ordering::SeqCst);
    match self.sender.send(element) {
      Ok(()) => Ok(()),
      Err(SendError(element)) => {
        self.decrement_count();
        Err(PutError::OfferError(element))
      }
    }
  }
}

#[async_trait]
impl<E: Element> BlockingQueueReader<E> for LinkedBlockingQueue<E> {
  async fn try_take(&self, timeout: Duration) -> Result<Option<E>, QueueError> {
    let interrupted = self.inner.interrupt.notified();
    tokio::pin!(interrupted);
    interrupted.as_mut().enable();
    if self.is_interrupted() {
      return Err(QueueError::InterruptedError);
    }
    if self.is_closed() {
      return Err(QueueError::PoolError);
    }

    let mut receiver = self.inner.receiver.lock().await;
    match receiver.try_recv() {
      Ok(element) => {
        self.decrement_count();
        return Ok(Some(element));
      }
      Err(TryRecvError::Disconnected) => return Err(QueueError::PoolError),
      Err(TryRecvError::Empty) if timeout.is_zero() => return Ok(None),
      Err(TryRecvError::Empty) => {}
    }

    tokio::select! {
      _ = &mut interrupted => Err(QueueError::InterruptedError),
      received = time::timeout(timeout, receiver.recv()) => match received {
        Ok(Some(element)) => {
          self.decrement_count();
          Ok(Some(element))
        }
        Ok(None) => Err(QueueError::PoolError),
        Err(_) => Ok(None),
      },
    }
  }

  fn interrupt(&self) {
    self.inner.interrupted.store(true, Ordering::SeqCst);
    self.inner.interrupt.notify_waiters();
  }

  fn is_interrupted(&self) -> bool {
    self.inner.interrupted.load(Ordering::SeqCst)
  }

  fn close(&self) {
    self.inner.is_closed.store(true, Ordering::SeqCst);
  }

  fn is_closed(&self) -> bool {
    self.inner.is_closed.load(Ordering::SeqCst)
  }

  async fn clean_up(&self) -> usize {
    self.close();
    let mut receiver = self.inner.receiver.lock().await;
    receiver.close();
    let mut discarded = 0;
    while receiver.try_recv().is_ok() {
      discarded += 1;
    }
    self.inner.count.store(0, Ordering::SeqCst);
    tracing::debug!(discarded, "linked blocking queue closed");
    discarded
  }
}
