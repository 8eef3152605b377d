use std::sync::Arc;
use std::time::Duration;

use batchq_utils_rs::collections::{BlockingQueueReader, QueueBase, QueueSize};
use tokio::time::{sleep, Instant};
use tracing_subscriber::EnvFilter;

use crate::builder::QueueBuilder;
use crate::config::StoreKind;
use crate::error::SendError;
use crate::sender::QueueSender;
use crate::store::create_store;

fn sender_for(builder: QueueBuilder) -> QueueSender<u32> {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
  let config = Arc::new(builder.build_config().unwrap());
  let store = create_store(&config);
  QueueSender::new(config, store)
}

#[tokio::test]
async fn test_full_array_store_times_out_and_returns_element() {
  let sender = sender_for(
    QueueBuilder::default()
      .with_name("bp")
      .with_capacity(2)
      .with_enqueue_timeout(Duration::ZERO),
  );
  sender.send(1).await.unwrap();
  sender.send(2).await.unwrap();

  match sender.send(3).await {
    Err(SendError::Timeout { queue, timeout, element }) => {
      assert_eq!(queue, "bp");
      assert_eq!(timeout, Duration::ZERO);
      assert_eq!(element, 3);
    }
    other => panic!("expected a timeout, got {:?}", other),
  }
  assert_eq!(sender.store.len().await, QueueSize::Limited(2));
}

#[tokio::test]
async fn test_send_waits_up_to_enqueue_timeout() {
  let sender = sender_for(
    QueueBuilder::default()
      .with_capacity(1)
      .with_enqueue_timeout(Duration::from_millis(40)),
  );
  sender.send(1).await.unwrap();

  let started = Instant::now();
  let err = sender.send(2).await.unwrap_err();
  assert!(err.is_timeout());
  assert!(started.elapsed() >= Duration::from_millis(40));
  assert_eq!(err.into_element(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_send_succeeds_once_space_frees_up() {
  let sender = sender_for(
    QueueBuilder::default()
      .with_capacity(1)
      .with_enqueue_timeout(Duration::from_secs(2)),
  );
  sender.send(1).await.unwrap();

  let store = sender.store.clone();
  tokio::spawn(async move {
    sleep(Duration::from_millis(20)).await;
    store.try_take(Duration::ZERO).await
  });

  sender.send(2).await.unwrap();
  assert_eq!(sender.store.try_take(Duration::ZERO).await, Ok(Some(2)));
}

#[tokio::test]
async fn test_send_to_closed_store_is_rejected() {
  let sender = sender_for(QueueBuilder::default().with_name("closed"));
  sender.store.clean_up().await;

  let err = sender.send(5).await.unwrap_err();
  assert!(err.is_closed());
  assert_eq!(err.to_string(), "queue `closed` is closed");
  assert_eq!(err.into_element(), 5);
}

#[tokio::test]
async fn test_send_all_stops_at_first_failure() {
  let sender = sender_for(
    QueueBuilder::default()
      .with_capacity(3)
      .with_enqueue_timeout(Duration::ZERO),
  );
  let err = sender.send_all(1..=5).await.unwrap_err();
  assert_eq!(err.into_element(), 4);
  assert_eq!(sender.store.len().await, QueueSize::Limited(3));
}

#[tokio::test]
async fn test_transfer_without_taker_falls_back_to_timed_put() {
  let sender = sender_for(
    QueueBuilder::default()
      .with_store_kind(StoreKind::SynchronousTransfer)
      .with_try_transfer(true)
      .with_enqueue_timeout(Duration::from_millis(20)),
  );
  let started = Instant::now();
  let err = sender.send(8).await.unwrap_err();
  assert!(err.is_timeout());
  assert!(started.elapsed() >= Duration::from_millis(20));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_transfer_hands_off_to_waiting_taker() {
  let sender = sender_for(
    QueueBuilder::default()
      .with_store_kind(StoreKind::SynchronousTransfer)
      .with_try_transfer(true)
      .with_enqueue_timeout(Duration::from_secs(2)),
  );
  let store = sender.store.clone();
  let taker = tokio::spawn(async move { store.try_take(Duration::from_secs(2)).await });
  sleep(Duration::from_millis(20)).await;

  sender.send(11).await.unwrap();
  assert_eq!(taker.await.unwrap(), Ok(Some(11)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clones_share_one_store() {
  let sender = sender_for(QueueBuilder::default().with_store_kind(StoreKind::UnboundedLinked));
  let mut handles = vec![];
  for p in 0..4u32 {
    let sender = sender.clone();
    handles.push(tokio::spawn(async move { sender.send_all((0..25).map(|i| p * 100 + i)).await }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }
  assert_eq!(sender.store.len().await, QueueSize::Limited(100));
}
