use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use thiserror::Error;

mod array_blocking_queue;
mod linked_blocking_queue;
mod synchronous_queue;

pub use self::{array_blocking_queue::*, linked_blocking_queue::*, synchronous_queue::*};

use crate::collections::element::Element;

const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Returns the instant `timeout` from now, saturating instead of overflowing.
pub(crate) fn deadline_after(timeout: Duration) -> tokio::time::Instant {
  let now = tokio::time::Instant::now();
  now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// An error that occurs when an element cannot be put into a queue. The element is always
/// handed back.<br/>
/// 要素をキューに投入できなかった場合に発生するエラー。要素は必ず返却されます。
#[derive(Error, Debug, PartialEq)]
pub enum PutError<E> {
  /// The queue is closed and rejected the element.<br/>
  /// キューが閉じられているため要素を受け付けなかった。
  #[error("Failed to offer an element: {0:?}")]
  OfferError(E),
  /// The element could not be handed over before the timeout elapsed.<br/>
  /// タイムアウトまでに要素を引き渡せなかった。
  #[error("Timed out offering an element: {0:?}")]
  TimeoutError(E),
}

/// An error that occurs when an element cannot be taken from a queue.<br/>
/// キューから要素を取り出せなかった場合に発生するエラー。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
  /// The queue is closed and nothing can be polled from it.<br/>
  /// キューが閉じられているため要素を取り出せない。
  #[error("Failed to poll an element")]
  PoolError,
  /// A waiting take was interrupted.<br/>
  /// 待機中の取り出しが中断された。
  #[error("Failed to interrupt")]
  InterruptedError,
}

/// The size of the queue.<br/>
/// キューのサイズ。
#[derive(Debug, Clone, Copy)]
pub enum QueueSize {
  /// The queue has no capacity limit.<br/>
  /// キューに容量制限がない。
  Limitless,
  /// The queue has a capacity limit.<br/>
  /// キューに容量制限がある。
  Limited(usize),
}

impl QueueSize {
  /// Converts to a usize type.<br/>
  /// usize型に変換します。
  ///
  /// # Return Value / 戻り値
  /// - `usize::MAX` - If the queue has no capacity limit. / キューに容量制限がない場合。
  /// - `num` - If the queue has a capacity limit. / キューに容量制限がある場合。
  pub fn to_usize(&self) -> usize {
    match self {
      QueueSize::Limitless => usize::MAX,
      QueueSize::Limited(c) => *c,
    }
  }
}

impl PartialEq<Self> for QueueSize {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (QueueSize::Limitless, QueueSize::Limitless) => true,
      (QueueSize::Limited(l), QueueSize::Limited(r)) => l == r,
      _ => false,
    }
  }
}

impl Eq for QueueSize {}

/// A trait that defines the behavior of a queue.<br/>
/// キューの振る舞いを定義するトレイト。
#[async_trait]
pub trait QueueBase<E: Element>: Debug + Send + Sync {
  /// Returns whether this queue is empty.<br/>
  /// このキューが空かどうかを返します。
  ///
  /// # Return Value / 戻り値
  /// - `true` - If the queue is empty. / キューが空の場合。
  /// - `false` - If the queue is not empty. / キューが空でない場合。
  async fn is_empty(&self) -> bool {
    self.len().await == QueueSize::Limited(0)
  }

  /// Returns the length of this queue. The value is a snapshot and may be stale
  /// as soon as it is returned.<br/>
  /// このキューの長さを返します。値はスナップショットであり、返された時点で古くなっている可能性があります。
  async fn len(&self) -> QueueSize;

  /// Returns the capacity of this queue.<br/>
  /// このキューの最大容量を返します。
  ///
  /// # Return Value / 戻り値
  /// - `QueueSize::Limitless` - If the queue has no capacity limit. / キューに容量制限がない場合。
  /// - `QueueSize::Limited(num)` - If the queue has a capacity limit. / キューに容量制限がある場合。
  async fn capacity(&self) -> QueueSize;
}

/// The producer side of a blocking queue.<br/>
/// ブロッキングキューの書き込み側。
#[async_trait]
pub trait BlockingQueueWriter<E: Element>: QueueBase<E> {
  /// Inserts the specified element, waiting up to `timeout` for the queue to accept it.<br/>
  /// 指定された要素を挿入します。キューが受け付けるまで最大 `timeout` 待機します。
  ///
  /// # Arguments / 引数
  /// - `element` - The element to be inserted. / 挿入する要素。
  /// - `timeout` - The maximum time to wait. / 最大待機時間。
  ///
  /// # Return Value / 戻り値
  /// - `Ok(())` - If the element is accepted. / 要素が受け付けられた場合。
  /// - `Err(PutError::TimeoutError(element))` - If the timeout elapsed first. / 先にタイムアウトした場合。
  /// - `Err(PutError::OfferError(element))` - If the queue is closed. / キューが閉じられている場合。
  async fn try_put(&self, element: E, timeout: Duration) -> Result<(), PutError<E>>;

  /// Hands the element over only if that can happen immediately.<br/>
  /// 即座に引き渡せる場合に限り要素を引き渡します。
  ///
  /// # Return Value / 戻り値
  /// - `Ok(())` - If the element is accepted. / 要素が受け付けられた場合。
  /// - `Err(PutError::TimeoutError(element))` - If no immediate hand-off was possible. / 即座に引き渡せなかった場合。
  async fn try_transfer(&self, element: E) -> Result<(), PutError<E>> {
    self.try_put(element, Duration::ZERO).await
  }
}

/// The consumer side of a blocking queue.<br/>
/// ブロッキングキューの読み込み側。
#[async_trait]
pub trait BlockingQueueReader<E: Element>: QueueBase<E> {
  /// Retrieves and deletes the head of the queue, waiting up to `timeout` for an element.<br/>
  /// キューの先頭を取得および削除します。要素が届くまで最大 `timeout` 待機します。
  ///
  /// # Return Value / 戻り値
  /// - `Ok(Some(element))` - If the element is retrieved successfully. / 要素が正常に取得された場合。
  /// - `Ok(None)` - If the timeout elapsed. / タイムアウトした場合。
  /// - `Err(QueueError::InterruptedError)` - If the queue has been interrupted. / 中断された場合。
  /// - `Err(QueueError::PoolError)` - If the queue is closed. / キューが閉じられている場合。
  async fn try_take(&self, timeout: Duration) -> Result<Option<E>, QueueError>;

  /// Interrupts every current and future take. Producers are not affected.<br/>
  /// 現在および今後の取り出しをすべて中断します。書き込み側には影響しません。
  fn interrupt(&self);

  /// Returns whether the take side of this queue has been interrupted.<br/>
  /// このキューの取り出しが中断されたかどうかを返します。
  fn is_interrupted(&self) -> bool;

  /// Closes the queue without waiting. Later puts fail with `PutError::OfferError` and later
  /// takes with `QueueError::PoolError`. Buffered elements stay until `clean_up`.<br/>
  /// 待機せずにキューを閉じます。以降の投入は `PutError::OfferError`、取り出しは
  /// `QueueError::PoolError` で失敗します。バッファ内の要素は `clean_up` まで残ります。
  fn close(&self);

  /// Returns whether this queue has been closed.<br/>
  /// このキューが閉じられたかどうかを返します。
  fn is_closed(&self) -> bool;

  /// Closes the queue and discards any buffered elements.<br/>
  /// キューを閉じ、バッファ内の要素を破棄します。
  ///
  /// # Return Value / 戻り値
  /// - The number of discarded elements. / 破棄された要素数。
  async fn clean_up(&self) -> usize;
}

/// A queue that can be both written and read.<br/>
/// 読み書き両方が可能なキュー。
pub trait BlockingQueue<E: Element>: BlockingQueueWriter<E> + BlockingQueueReader<E> {}

impl<E: Element, Q: BlockingQueueWriter<E> + BlockingQueueReader<E>> BlockingQueue<E> for Q {}

/// A shared, type-erased blocking queue.<br/>
/// 共有可能で型消去されたブロッキングキュー。
pub struct BlockingQueueHandle<E>(Arc<dyn BlockingQueue<E>>);

impl<E: Element> BlockingQueueHandle<E> {
  pub fn new(queue: impl BlockingQueue<E> + 'static) -> Self {
    Self(Arc::new(queue))
  }
}

impl<E> Clone for BlockingQueueHandle<E> {
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}

impl<E> Debug for BlockingQueueHandle<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("BlockingQueueHandle").field(&self.0).finish()
  }
}

impl<E> PartialEq for BlockingQueueHandle<E> {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl<E> Eq for BlockingQueueHandle<E> {}

#[async_trait]
impl<E: Element> QueueBase<E> for BlockingQueueHandle<E> {
  async fn is_empty(&self) -> bool {
    self.0.is_empty().await
  }

  async fn len(&self) -> QueueSize {
    self.0.len().await
  }

  async fn capacity(&self) -> QueueSize {
    self.0.capacity().await
  }
}

#[async_trait]
impl<E: Element> BlockingQueueWriter<E> for BlockingQueueHandle<E> {
  async fn try_put(&self, element: E, timeout: Duration) -> Result<(), PutError<E>> {
    self.0.try_put(element, timeout).await
  }

  async fn try_transfer(&self, element: E) -> Result<(), PutError<E>> {
    self.0.try_transfer(element).await
  }
}

#[async_trait]
impl<E: Element> BlockingQueueReader<E> for BlockingQueueHandle<E> {
  async fn try_take(&self, timeout: Duration) -> Result<Option<E>, QueueError> {
    self.0.try_take(timeout).await
  }

  fn interrupt(&self) {
    self.0.interrupt()
  }

  fn is_interrupted(&self) -> bool {
    self.0.is_interrupted()
  }

  fn close(&self) {
    self.0.close()
  }

  fn is_closed(&self) -> bool {
    self.0.is_closed()
  }

  async fn clean_up(&self) -> usize {
    self.0.clean_up().await
  }
}

static_assertions::assert_impl_all!(BlockingQueueHandle<u32>: Send, Sync, Clone);
