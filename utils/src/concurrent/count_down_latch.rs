use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_condvar::Condvar;


/// Lets tasks wait until a number of events have happened elsewhere.
#[derive(Clone)]
pub struct CountDownLatch {
  count: Arc<Mutex<usize>>,
  condvar: Arc<Condvar>,
}

impl Debug for CountDownLatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CountDownLatch").field("count", &self.count).finish()
  }
}

impl Default for CountDownLatch {
  fn default() -> Self {
    Self::new(0)
  }
}

impl CountDownLatch {
  pub fn new(count: usize) -> Self {
    Self {
      count: Arc::new(Mutex::new(count)),
      condvar: Arc::new(Condvar::new()),
    }
  }

  pub async fn count(&self) -> usize {
    *self.count.lock().await
  }

  /// Decrements by `n`, never going below zero.
  pub async fn count_down_by(&self, n: usize) {
    let mut count = self.count.lock().await;
    *count = count.saturating_sub(n);
    if *count == 0 {
      self.condvar.notify_all();
    }
  }

  pub async fn count_down(&self) {
    self.count_down_by(1).await
  }

  pub async fn wait(&self) {
    let mut count = self.count.lock().await;
    while *count > 0 {
      count = self.condvar.wait(count).await;
    }
  }

  /// Returns `false` if the count did not reach zero within `timeout`.
  pub async fn wait_timeout(&self, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, self.wait()).await.is_ok()
  }
}
