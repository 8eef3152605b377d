use std::time::Duration;

use thiserror::Error;

/// Rejected builder state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("batch size must be at least 1, got {0}")]
  InvalidBatchSize(i64),
  #[error("capacity must be positive for a bounded array store, got {0}")]
  InvalidCapacity(i64),
  #[error("capacity {requested} exceeds the bounded array limit of {max}")]
  CapacityTooLarge { requested: i64, max: usize },
  #[error("check_every must be at least 1 while busy checking is enabled, got {0}")]
  InvalidCheckEvery(i64),
  #[error("queue name must not be empty")]
  EmptyName,
}

/// Returned to a producer whose element was not accepted.
///
/// `Timeout` is the backpressure signal: the caller decides whether to retry, drop or escalate.
#[derive(Debug, Error)]
pub enum SendError<E> {
  #[error("enqueue on queue `{queue}` timed out after {timeout:?}")]
  Timeout { queue: String, timeout: Duration, element: E },
  #[error("queue `{queue}` is closed")]
  Closed { queue: String, element: E },
}

impl<E> SendError<E> {
  pub fn is_timeout(&self) -> bool {
    matches!(self, SendError::Timeout { .. })
  }

  pub fn is_closed(&self) -> bool {
    matches!(self, SendError::Closed { .. })
  }

  /// Hands the rejected element back to the producer.
  pub fn into_element(self) -> E {
    match self {
      SendError::Timeout { element, .. } | SendError::Closed { element, .. } => element,
    }
  }
}

#[derive(Debug, Error)]
pub enum StartError {
  #[error("queue `{0}` has already been started")]
  AlreadyStarted(String),
  #[error("no tokio runtime is available to poll queue `{queue}`")]
  NoRuntime {
    queue: String,
    #[source]
    source: tokio::runtime::TryCurrentError,
  },
}

/// A failure raised by a batch listener while processing one batch.
#[derive(Debug, Error)]
pub enum ListenerError {
  #[error("listener failed: {0}")]
  Failed(String),
  #[error("listener panicked: {0}")]
  Panicked(String),
  #[error(transparent)]
  Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ListenerError {
  pub fn failed(message: impl Into<String>) -> Self {
    ListenerError::Failed(message.into())
  }
}
