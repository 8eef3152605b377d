use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::collections::queue::{
  deadline_after, BlockingQueueReader, BlockingQueueWriter, PutError, QueueBase, QueueError, QueueSize,
};
use crate::collections::Element;
use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time;


#[derive(Debug)]
struct Ring<E> {
  buffer: Vec<Option<E>>,
  head: usize,
  len: usize,
}

impl<E> Ring<E> {
  fn new(capacity: usize) -> Self {
    let mut buffer = Vec::with_capacity(capacity);
    buffer.resize_with(capacity, || None);
    Self {
      buffer,
      head: 0,
      len: 0,
    }
  }

  fn is_full(&self) -> bool {
    self.len == self.buffer.len()
  }

  fn push(&mut self, element: E) {
    let tail = (self.head + self.len) % self.buffer.len();
    self.buffer[tail] = Some(element);
    self.len += 1;
  }

  fn pop(&mut self) -> Option<E> {
    if self.len == 0 {
      return None;
    }
    let item = self.buffer[self.head].take();
    self.head = (self.head + 1) % self.buffer.len();
    self.len -= 1;
    item
  }

  fn clear(&mut self) -> usize {
    let discarded = self.len;
    self.buffer.iter_mut().for_each(|item| *item = None);
    self.head = 0;
    self.len = 0;
    discarded
  }
}

#[derive(Debug)]
struct Inner<E> {
  ring: Mutex<Ring<E>>,
  capacity: usize,
  not_empty: Notify,
  not_full: Notify,
  interrupt: Notify,
  interrupted: AtomicBool,
  closed: AtomicBool,
}

/// A fixed-capacity FIFO queue backed by a circular buffer.
///
/// Producers wait for a free slot up to their timeout; the consumer waits for an element
/// up to its timeout.
pub struct ArrayBlockingQueue<E> {
  inner: Arc<Inner<E>>,
}

impl<E> ArrayBlockingQueue<E> {
  pub fn new(capacity: usize) -> Self {
    assert!(capacity > 0, "Capacity must be greater than zero");
    Self {
      inner: Arc::new(Inner {
        ring: Mutex::new(Ring::new(capacity)),
        capacity,
        not_empty: Notify::new(),
        not_full: Notify::new(),
        interrupt: Notify::new(),
        interrupted: AtomicBool::new(false),
        closed: AtomicBool::new(false),
      }),
    }
  }
}

impl<E> Clone for ArrayBlockingQueue<E> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<E: Debug> Debug for ArrayBlockingQueue<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ArrayBlockingQueue")
      .field("capacity", &self.inner.capacity)
      .field("interrupted", &self.inner.interrupted.load(Ordering::Relaxed))
      .field("closed", &self.inner.closed.load(Ordering::Relaxed))
      .finish()
  }
}

#[async_trait]
impl<E: Element> QueueBase<E> for ArrayBlockingQueue<E> {
  async fn len(&self) -> QueueSize {
    let ring = self.inner.ring.lock().await;
    QueueSize::Limited(ring.len)
  }

  async fn capacity(&self) -> QueueSize {
    QueueSize::Limited(self.inner.capacity)
  }
}

#[async_trait]
impl<E: Element> BlockingQueueWriter<E> for ArrayBlockingQueue<E> {
  async fn try_put(&self, element: E, timeout: Duration) -> Result<(), PutError<E>> {
    let deadline = deadline_after(timeout);
    loop {
      {
        let mut ring = self.inner.ring.lock().await;
        if self.is_closed() {
          return Err(PutError::OfferError(element));
        }
        if !ring.is_full() {
          ring.push(element);
          drop(ring);
          self.inner.not_empty.notify_one();
          return Ok(());
        }
      }
      if time::timeout_at(deadline, self.inner.not_full.notified()).await.is_err() {
        return Err(PutError::TimeoutError(element));
      }
    }
  }
}

#[async_trait]
impl<E: Element> BlockingQueueReader<E> for ArrayBlockingQueue<E> {
  async fn try_take(&self, timeout: Duration) -> Result<Option<E>, QueueError> {
    let deadline = deadline_after(timeout);
    loop {
      let interrupted = self.inner.interrupt.notified();
      tokio::pin!(interrupted);
      interrupted.as_mut().enable();
      if self.is_interrupted() {
        return Err(QueueError::InterruptedError);
      }
      {
        let mut ring = self.inner.ring.lock().await;
        if self.is_closed() {
          return Err(QueueError::PoolError);
        }
        if let Some(element) = ring.pop() {
          drop(ring);
          self.inner.not_full.notify_one();
          return Ok(Some(element));
        }
      }
      tokio::select! {
        _ = &mut interrupted => return Err(QueueError::InterruptedError),
        woke = time::timeout_at(deadline, self.inner.not_empty.notified()) => {
          if woke.is_err() {
            return Ok(None);
          }
        }
      }
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
    self.inner.closed.store(true, Ordering::SeqCst);
    // Takers observe the closed state; blocked producers keep their own timeout.
    self.inner.not_empty.notify_waiters();
  }

  fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::SeqCst)
  }

  async fn clean_up(&self) -> usize {
    let mut ring = self.inner.ring.lock().await;
    self.close();
    let discarded = ring.clear();
    drop(ring);
    tracing::debug!(discarded, capacity = self.inner.capacity, "array blocking queue closed");
    discarded
  }
}
