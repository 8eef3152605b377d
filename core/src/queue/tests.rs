use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing_subscriber::EnvFilter;

use crate::builder::QueueBuilder;
use crate::config::StoreKind;
use crate::error::{SendError, StartError};
use crate::listener::BatchListenerHandle;
use crate::poller::PollerState;
use crate::queue::ShutdownOutcome;

fn init_logger() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

fn collecting_listener(sink: Arc<Mutex<Vec<Vec<u32>>>>) -> BatchListenerHandle<u32> {
  BatchListenerHandle::from_fn(move |batch: Vec<u32>| {
    let sink = sink.clone();
    async move {
      sink.lock().await.push(batch);
      Ok(())
    }
  })
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
  init_logger();
  let queue = QueueBuilder::default().with_name("twice").build::<u32>().unwrap();
  let sink = Arc::new(Mutex::new(vec![]));
  assert!(!queue.is_started());

  queue.start(collecting_listener(sink.clone())).await.unwrap();
  assert!(queue.is_started());
  match queue.start(collecting_listener(sink)).await {
    Err(StartError::AlreadyStarted(name)) => assert_eq!(name, "twice"),
    other => panic!("expected AlreadyStarted, got {:?}", other),
  }
  assert_eq!(queue.stop().await, ShutdownOutcome::Graceful);
}

#[test]
fn test_start_outside_runtime_fails() {
  let queue = QueueBuilder::default().build::<u32>().unwrap();
  let sink = Arc::new(Mutex::new(vec![]));
  let result = futures::executor::block_on(queue.start(collecting_listener(sink)));
  assert!(matches!(result, Err(StartError::NoRuntime { .. })));
  assert!(!queue.is_started());
}

#[tokio::test]
async fn test_stop_without_start_closes_store() {
  init_logger();
  let queue = QueueBuilder::default().build::<u32>().unwrap();
  let sender = queue.sender();
  sender.send(1).await.unwrap();

  assert_eq!(queue.stop().await, ShutdownOutcome::NotRunning);
  assert_eq!(queue.poller_state(), PollerState::Resting);
  assert!(queue.is_empty().await);
  assert!(matches!(sender.send(2).await, Err(SendError::Closed { element: 2, .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_is_reported_once() {
  init_logger();
  let queue = QueueBuilder::default().build::<u32>().unwrap();
  queue.start(collecting_listener(Arc::new(Mutex::new(vec![])))).await.unwrap();
  assert_eq!(queue.stop().await, ShutdownOutcome::Graceful);
  assert_eq!(queue.poller_state(), PollerState::Stopped);
  assert_eq!(queue.stop().await, ShutdownOutcome::NotRunning);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_aborts_after_grace_period() {
  init_logger();
  let queue = QueueBuilder::default()
    .with_batch_size(1)
    .with_shutdown_grace(Duration::from_millis(50))
    .build::<u32>()
    .unwrap();
  queue
    .start(BatchListenerHandle::from_fn(|_batch: Vec<u32>| async move {
      sleep(Duration::from_secs(30)).await;
      Ok(())
    }))
    .await
    .unwrap();
  queue.sender().send(1).await.unwrap();
  sleep(Duration::from_millis(20)).await;

  let started = Instant::now();
  assert_eq!(queue.stop().await, ShutdownOutcome::Forced);
  assert!(started.elapsed() < Duration::from_secs(5));
  assert_eq!(queue.poller_state(), PollerState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_discards_buffered_items_and_closes_store() {
  init_logger();
  let queue = QueueBuilder::default()
    .with_batch_size(1)
    .with_capacity(10)
    .with_enqueue_timeout(Duration::ZERO)
    .build::<u32>()
    .unwrap();
  let sink = Arc::new(Mutex::new(vec![]));
  let slow_sink = sink.clone();
  queue
    .start(BatchListenerHandle::from_fn(move |batch: Vec<u32>| {
      let sink = slow_sink.clone();
      async move {
        sleep(Duration::from_millis(100)).await;
        sink.lock().await.push(batch);
        Ok(())
      }
    }))
    .await
    .unwrap();

  let sender = queue.sender();
  sender.send_all(1..=5).await.unwrap();
  sleep(Duration::from_millis(20)).await;

  assert_eq!(queue.stop().await, ShutdownOutcome::Graceful);
  assert_eq!(*sink.lock().await, vec![vec![1]]);
  assert_eq!(queue.len().await, 0);
  assert!(matches!(sender.send(6).await, Err(SendError::Closed { element: 6, .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_senders_feed_the_listener() {
  init_logger();
  let queue = QueueBuilder::default()
    .with_store_kind(StoreKind::UnboundedLinked)
    .with_batch_size(4)
    .with_poll_wait(Duration::from_millis(5))
    .build::<u32>()
    .unwrap();
  let sink = Arc::new(Mutex::new(vec![]));
  queue.start(collecting_listener(sink.clone())).await.unwrap();

  queue.sender().send_all(0..10).await.unwrap();
  timeout(Duration::from_secs(2), async {
    while sink.lock().await.iter().map(Vec::len).sum::<usize>() < 10 {
      sleep(Duration::from_millis(2)).await;
    }
  })
  .await
  .unwrap();

  let stats = queue.stats();
  assert_eq!(stats.items, 10);
  assert!(stats.batches >= 3);
  assert_eq!(queue.stop().await, ShutdownOutcome::Graceful);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drop_aborts_running_poller() {
  init_logger();
  let sink = Arc::new(Mutex::new(vec![]));
  let queue = QueueBuilder::default()
    .with_store_kind(StoreKind::UnboundedLinked)
    .with_poll_wait(Duration::from_millis(5))
    .build::<u32>()
    .unwrap();
  queue.start(collecting_listener(sink.clone())).await.unwrap();
  let sender = queue.sender();
  drop(queue);

  sleep(Duration::from_millis(20)).await;
  assert!(matches!(sender.send(1).await, Err(SendError::Closed { element: 1, .. })));
  sleep(Duration::from_millis(50)).await;
  assert!(sink.lock().await.is_empty());
}

#[rstest]
#[case(StoreKind::BoundedArray)]
#[case(StoreKind::UnboundedLinked)]
#[case(StoreKind::SynchronousTransfer)]
#[tokio::test]
async fn test_dropping_unstarted_queue_closes_store(#[case] store_kind: StoreKind) {
  let queue = QueueBuilder::default()
    .with_store_kind(store_kind)
    .with_enqueue_timeout(Duration::from_millis(10))
    .build::<u32>()
    .unwrap();
  let sender = queue.sender();
  drop(queue);

  for i in 0..3 {
    assert!(sender.send(i).await.unwrap_err().is_closed());
  }
}

#[tokio::test]
async fn test_accessors_reflect_config() {
  let queue = QueueBuilder::default()
    .with_name("orders")
    .with_capacity(3)
    .with_enqueue_timeout(Duration::ZERO)
    .build::<u32>()
    .unwrap();
  assert_eq!(queue.name(), "orders");
  assert_eq!(queue.config().batch_size(), 3);
  assert!(queue.is_empty().await);

  queue.sender().send(1).await.unwrap();
  queue.sender().send(2).await.unwrap();
  assert_eq!(queue.len().await, 2);
  assert!(format!("{:?}", queue).contains("orders"));
}
