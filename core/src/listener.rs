use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ListenerError;

/// Consumer of the batches a queue's poller produces.
///
/// `receive` is called from the poller task only, one batch at a time and in store order.
/// An `Err` or a panic does not stop the poller; it is passed to [`BatchListener::report_error`].
#[async_trait]
pub trait BatchListener<E>: Debug + Send + Sync + 'static {
  async fn receive(&self, batch: Vec<E>) -> Result<(), ListenerError>;

  async fn report_error(&self, error: ListenerError) {
    tracing::error!(error = %error, "batch listener failed");
  }

  /// Called when a resting poll comes back empty.
  async fn idle(&self) {}

  /// Called once after the final batch, before the poller exits.
  async fn shutdown(&self) {}
}

type ReceiveFn<E> = dyn Fn(Vec<E>) -> BoxFuture<'static, Result<(), ListenerError>> + Send + Sync + 'static;

/// Adapts an async closure into a [`BatchListener`].
pub struct BatchListenerFunc<E>(Arc<ReceiveFn<E>>);

impl<E: Send + 'static> BatchListenerFunc<E> {
  pub fn new<F, Fut>(f: F) -> Self
  where
    F: Fn(Vec<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static, {
    BatchListenerFunc(Arc::new(move |batch| Box::pin(f(batch))))
  }
}

impl<E> Clone for BatchListenerFunc<E> {
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}

impl<E> Debug for BatchListenerFunc<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "BatchListenerFunc")
  }
}

#[async_trait]
impl<E: Send + 'static> BatchListener<E> for BatchListenerFunc<E> {
  async fn receive(&self, batch: Vec<E>) -> Result<(), ListenerError> {
    (self.0)(batch).await
  }
}

pub struct BatchListenerHandle<E>(Arc<dyn BatchListener<E>>);

impl<E: Send + 'static> BatchListenerHandle<E> {
  pub fn new(listener: impl BatchListener<E>) -> Self {
    Self(Arc::new(listener))
  }

  pub fn from_fn<F, Fut>(f: F) -> Self
  where
    F: Fn(Vec<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static, {
    Self::new(BatchListenerFunc::new(f))
  }
}

impl<E> Clone for BatchListenerHandle<E> {
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}

impl<E> Debug for BatchListenerHandle<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("BatchListenerHandle").field(&self.0).finish()
  }
}

impl<E> PartialEq for BatchListenerHandle<E> {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl<E> Eq for BatchListenerHandle<E> {}

#[async_trait]
impl<E: Send + 'static> BatchListener<E> for BatchListenerHandle<E> {
  async fn receive(&self, batch: Vec<E>) -> Result<(), ListenerError> {
    self.0.receive(batch).await
  }

  async fn report_error(&self, error: ListenerError) {
    self.0.report_error(error).await
  }

  async fn idle(&self) {
    self.0.idle().await
  }

  async fn shutdown(&self) {
    self.0.shutdown().await
  }
}

impl<E: Send + 'static, L: BatchListener<E>> From<Arc<L>> for BatchListenerHandle<E> {
  fn from(listener: Arc<L>) -> Self {
    Self(listener)
  }
}

static_assertions::assert_impl_all!(BatchListenerHandle<u32>: Send, Sync, Clone);
