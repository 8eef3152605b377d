use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::collections::element::Element;
use crate::collections::{BlockingQueueReader, BlockingQueueWriter, PutError, QueueBase, QueueError, QueueSize};
use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::time;


struct ParkedProducer<E> {
  id: u64,
  element: E,
  ack: oneshot::Sender<()>,
}

struct WaitingConsumer<E> {
  id: u64,
  slot: oneshot::Sender<E>,
}

struct State<E> {
  producers: VecDeque<ParkedProducer<E>>,
  consumers: VecDeque<WaitingConsumer<E>>,
  next_id: u64,
}

impl<E> State<E> {
  fn next_id(&mut self) -> u64 {
    self.next_id = self.next_id.wrapping_add(1);
    self.next_id
  }

  /// Gives the element to the oldest consumer that is still listening.
  fn hand_to_consumer(&mut self, element: E) -> Result<(), E> {
    let mut element = element;
    while let Some(consumer) = self.consumers.pop_front() {
      match consumer.slot.send(element) {
        Ok(()) => return Ok(()),
        Err(returned) => element = returned,
      }
    }
    Err(element)
  }

  fn withdraw_producer(&mut self, id: u64) -> Option<E> {
    let position = self.producers.iter().position(|p| p.id == id)?;
    self.producers.remove(position).map(|p| p.element)
  }

  fn withdraw_consumer(&mut self, id: u64) -> bool {
    match self.consumers.iter().position(|c| c.id == id) {
      Some(position) => self.consumers.remove(position).is_some(),
      None => false,
    }
  }
}

struct Inner<E> {
  state: Mutex<State<E>>,
  interrupt: Notify,
  interrupted: AtomicBool,
  closed: AtomicBool,
}

/// A queue without buffering: every put is a direct hand-off to a take.
///
/// A producer that finds no waiting consumer parks until one arrives or its timeout elapses.
/// Parked producers are served in arrival order. `len` reports the number of parked producers.
pub struct SynchronousQueue<E> {
  inner: Arc<Inner<E>>,
}

impl<E> SynchronousQueue<E> {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Inner {
        state: Mutex::new(State {
          producers: VecDeque::new(),
          consumers: VecDeque::new(),
          next_id: 0,
        }),
        interrupt: Notify::new(),
        interrupted: AtomicBool::new(false),
        closed: AtomicBool::new(false),
      }),
    }
  }
}

impl<E> Default for SynchronousQueue<E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E> Clone for SynchronousQueue<E> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<E> Debug for SynchronousQueue<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SynchronousQueue")
      .field("interrupted", &self.inner.interrupted.load(Ordering::Relaxed))
      .field("closed", &self.inner.closed.load(Ordering::Relaxed))
      .finish()
  }
}

#[async_trait]
impl<E: Element> QueueBase<E> for SynchronousQueue<E> {
  async fn len(&self) -> QueueSize {
    let state = self.inner.state.lock().await;
    QueueSize::Limited(state.producers.len())
  }

  async fn capacity(&self) -> QueueSize {
    QueueSize::Limited(0)
  }
}

#[async_trait]
impl<E: Element> BlockingQueueWriter<E> for SynchronousQueue<E> {
  /// With a zero timeout this succeeds only when a consumer is already waiting, which is
  /// exactly the non-blocking transfer.
  async fn try_put(&self, element: E, timeout: Duration) -> Result<(), PutError<E>> {
    let (id, mut ack) = {
      let mut state = self.inner.state.lock().await;
      if self.is_closed() {
        return Err(PutError::OfferError(element));
      }
      let element = match state.hand_to_consumer(element) {
        Ok(()) => return Ok(()),
        Err(element) => element,
      };
      if timeout.is_zero() {
        return Err(PutError::TimeoutError(element));
      }
      let id = state.next_id();
      let (ack, ack_receiver) = oneshot::channel();
      state.producers.push_back(ParkedProducer { id, element, ack });
      (id, ack_receiver)
    };

    if let Ok(Ok(())) = time::timeout(timeout, &mut ack).await {
      return Ok(());
    }

    let mut state = self.inner.state.lock().await;
    match state.withdraw_producer(id) {
      Some(element) if self.is_closed() => Err(PutError::OfferError(element)),
      Some(element) => Err(PutError::TimeoutError(element)),
      // A consumer claimed the element between the timeout and the lock.
      None => Ok(()),
    }
  }
}

#[async_trait]
impl<E: Element> BlockingQueueReader<E> for SynchronousQueue<E> {
  async fn try_take(&self, timeout: Duration) -> Result<Option<E>, QueueError> {
    let interrupted = self.inner.interrupt.notified();
    tokio::pin!(interrupted);
    interrupted.as_mut().enable();
    if self.is_interrupted() {
      return Err(QueueError::InterruptedError);
    }

    let (id, mut slot) = {
      let mut state = self.inner.state.lock().await;
      if self.is_closed() {
        return Err(QueueError::PoolError);
      }
      if let Some(producer) = state.producers.pop_front() {
        let _ = producer.ack.send(());
        return Ok(Some(producer.element));
      }
      if timeout.is_zero() {
        return Ok(None);
      }
      let id = state.next_id();
      let (slot, slot_receiver) = oneshot::channel();
      state.consumers.push_back(WaitingConsumer { id, slot });
      (id, slot_receiver)
    };

    let outcome = tokio::select! {
      _ = &mut interrupted => None,
      received = time::timeout(timeout, &mut slot) => Some(received),
    };
    if let Some(Ok(Ok(element))) = outcome {
      return Ok(Some(element));
    }

    let mut state = self.inner.state.lock().await;
    let withdrawn = state.withdraw_consumer(id);
    drop(state);
    if !withdrawn {
      // A producer may have filled the slot before we got the lock back.
      if let Ok(element) = slot.try_recv() {
        return Ok(Some(element));
      }
    }

    match outcome {
      None => Err(QueueError::InterruptedError),
      Some(Ok(Err(_))) if self.is_closed() => Err(QueueError::PoolError),
      Some(_) => Ok(None),
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
  }

  fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::SeqCst)
  }

  /// Parked producers are left to their own timeouts, so nothing is ever discarded here.
  async fn clean_up(&self) -> usize {
    let mut state = self.inner.state.lock().await;
    self.close();
    state.consumers.clear();
    tracing::debug!(parked = state.producers.len(), "synchronous queue closed");
    0
  }
}
