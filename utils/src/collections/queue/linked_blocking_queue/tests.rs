use std::time::Duration;

use crate::collections::{
  BlockingQueueReader, BlockingQueueWriter, LinkedBlockingQueue, PutError, QueueBase, QueueError, QueueSize,
};
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq)]
struct TestElement(i32);

#[tokio::test]
async fn test_new_queue() {
  let queue = LinkedBlockingQueue::<TestElement>::new();
  assert_eq!(queue.capacity().await, QueueSize::Limitless);
  assert_eq!(queue.len().await, QueueSize::Limited(0));
}

#[tokio::test]
async fn test_put_never_waits_for_space() {
  let queue = LinkedBlockingQueue::<TestElement>::new();

  for i in 0..10_000 {
    assert!(queue.try_put(TestElement(i), Duration::ZERO).await.is_ok());
  }
  assert_eq!(queue.len().await, QueueSize::Limited(10_000));

  for i in 0..10_000 {
    let element = queue.try_take(Duration::ZERO).await.unwrap().unwrap();
    assert_eq!(element, TestElement(i));
  }
  assert!(queue.is_empty().await);
  assert!(queue.try_take(Duration::ZERO).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_take_waits_for_late_element() {
  let queue = LinkedBlockingQueue::<TestElement>::new();
  let producer = {
    let queue = queue.clone();
    tokio::spawn(async move {
      sleep(Duration::from_millis(20)).await;
      queue.try_put(TestElement(7), Duration::ZERO).await
    })
  };

  let element = queue.try_take(Duration::from_secs(5)).await.unwrap();
  assert_eq!(element, Some(TestElement(7)));
  assert!(producer.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_take_times_out_on_empty_queue() {
  let queue = LinkedBlockingQueue::<TestElement>::new();
  assert_eq!(queue.try_take(Duration::from_millis(20)).await, Ok(None));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interrupt_wakes_waiting_take() {
  let queue = LinkedBlockingQueue::<TestElement>::new();
  let consumer = {
    let queue = queue.clone();
    tokio::spawn(async move { queue.try_take(Duration::from_secs(30)).await })
  };

  sleep(Duration::from_millis(20)).await;
  queue.interrupt();

  let result = tokio::time::timeout(Duration::from_secs(1), consumer)
    .await
    .expect("take was not interrupted")
    .unwrap();
  assert_eq!(result, Err(QueueError::InterruptedError));
  assert_eq!(queue.try_take(Duration::ZERO).await, Err(QueueError::InterruptedError));
}

#[tokio::test]
async fn test_close_rejects_puts_and_keeps_buffer_for_clean_up() {
  let queue = LinkedBlockingQueue::<TestElement>::new();
  queue.try_put(TestElement(1), Duration::ZERO).await.unwrap();
  queue.try_put(TestElement(2), Duration::ZERO).await.unwrap();

  queue.close();
  assert!(queue.is_closed());
  match queue.try_put(TestElement(3), Duration::ZERO).await {
    Err(PutError::OfferError(element)) => assert_eq!(element, TestElement(3)),
    other => panic!("Expected OfferError after close, got {:?}", other),
  }
  assert_eq!(queue.len().await, QueueSize::Limited(2));
  assert_eq!(queue.try_take(Duration::ZERO).await, Err(QueueError::PoolError));
  assert_eq!(queue.clean_up().await, 2);
}

#[tokio::test]
async fn test_clean_up_discards_and_closes() {
  let queue = LinkedBlockingQueue::<TestElement>::new();
  for i in 0..3 {
    queue.try_put(TestElement(i), Duration::ZERO).await.unwrap();
  }

  assert_eq!(queue.clean_up().await, 3);
  assert_eq!(queue.len().await, QueueSize::Limited(0));
  assert_eq!(queue.try_take(Duration::ZERO).await, Err(QueueError::PoolError));
  match queue.try_put(TestElement(4), Duration::ZERO).await {
    Err(PutError::OfferError(element)) => assert_eq!(element, TestElement(4)),
    other => panic!("Expected OfferError after clean_up, got {:?}", other),
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_keep_per_producer_order() {
  let queue = LinkedBlockingQueue::<(i32, i32)>::new();
  let mut handles = vec![];

  for producer in 0..4 {
    let q = queue.clone();
    handles.push(tokio::spawn(async move {
      for seq in 0..50 {
        q.try_put((producer, seq), Duration::ZERO).await.unwrap();
      }
    }));
  }
  for handle in handles {
    handle.await.unwrap();
  }

  let mut last_seen = [-1; 4];
  for _ in 0..200 {
    let (producer, seq) = queue.try_take(Duration::from_secs(1)).await.unwrap().unwrap();
    assert!(seq > last_seen[producer as usize]);
    last_seen[producer as usize] = seq;
  }
  assert_eq!(last_seen, [49; 4]);
}
