use batchq_utils_rs::collections::{
  ArrayBlockingQueue, BlockingQueueHandle, Element, LinkedBlockingQueue, QueueSize, SynchronousQueue,
};

use crate::config::{QueueConfig, StoreKind, DEFAULT_ARRAY_CAPACITY};

/// Creates the backing store selected by `config`.
pub fn create_store<E: Element>(config: &QueueConfig) -> BlockingQueueHandle<E> {
  match config.store_kind() {
    StoreKind::BoundedArray => {
      let capacity = match config.capacity() {
        QueueSize::Limited(n) if n > 0 => n,
        _ => DEFAULT_ARRAY_CAPACITY,
      };
      BlockingQueueHandle::new(ArrayBlockingQueue::new(capacity))
    }
    StoreKind::UnboundedLinked => BlockingQueueHandle::new(LinkedBlockingQueue::new()),
    StoreKind::SynchronousTransfer => BlockingQueueHandle::new(SynchronousQueue::new()),
  }
}

#[cfg(test)]
mod tests {
  use batchq_utils_rs::collections::{QueueBase, QueueSize};
  use rstest::rstest;

  use super::create_store;
  use crate::builder::QueueBuilder;
  use crate::config::StoreKind;

  #[rstest]
  #[case(StoreKind::BoundedArray, QueueSize::Limited(4))]
  #[case(StoreKind::UnboundedLinked, QueueSize::Limitless)]
  #[case(StoreKind::SynchronousTransfer, QueueSize::Limited(0))]
  #[tokio::test]
  async fn test_create_store_matches_kind(#[case] store_kind: StoreKind, #[case] capacity: QueueSize) {
    let config = QueueBuilder::default()
      .with_store_kind(store_kind)
      .with_capacity(4)
      .build_config()
      .unwrap();
    let store = create_store::<u32>(&config);
    assert_eq!(store.capacity().await, capacity);
    assert!(store.is_empty().await);
  }
}
