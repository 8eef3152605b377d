use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batchq_core_rs::{BatchListenerHandle, ConfigOption, QueueBuilder, SendError, StoreKind};
use batchq_utils_rs::concurrent::CountDownLatch;
use clap::Parser;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
  /// array, linked or transfer
  #[clap(long, default_value = "array")]
  store: StoreKind,

  #[clap(long, default_value = "64")]
  capacity: i64,

  #[clap(long, default_value = "16")]
  batch_size: i64,

  #[clap(long, default_value = "10ms", value_parser = humantime::parse_duration)]
  enqueue_timeout: Duration,

  /// Time the listener spends on each batch.
  #[clap(long, default_value = "50ms", value_parser = humantime::parse_duration)]
  work: Duration,

  #[clap(long, default_value = "4")]
  producers: u32,

  #[clap(long, default_value = "500")]
  items: u32,
}

#[tokio::main]
async fn main() {
  env::set_var("RUST_LOG", "queue_backpressure=info,batchq_core_rs=info");
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let args = Args::parse();
  let queue = match QueueBuilder::default()
    .with_options([
      ConfigOption::with_name("backpressure-demo"),
      ConfigOption::with_store_kind(args.store),
      ConfigOption::with_capacity(args.capacity),
      ConfigOption::with_batch_size(args.batch_size),
      ConfigOption::with_enqueue_timeout(args.enqueue_timeout),
      ConfigOption::with_check_every(20),
    ])
    .build::<u64>()
  {
    Ok(queue) => queue,
    Err(err) => {
      tracing::error!(error = %err, "invalid configuration");
      return;
    }
  };

  let expected = u64::from(args.producers) * u64::from(args.items);
  let delivered = Arc::new(AtomicU64::new(0));
  let latch = CountDownLatch::new(expected as usize);
  let counter = delivered.clone();
  let listener_latch = latch.clone();
  let work = args.work;
  if let Err(err) = queue
    .start(BatchListenerHandle::from_fn(move |batch: Vec<u64>| {
      let counter = counter.clone();
      let latch = listener_latch.clone();
      async move {
        sleep(work).await;
        counter.fetch_add(batch.len() as u64, Ordering::Relaxed);
        latch.count_down_by(batch.len()).await;
        tracing::info!("Processed a batch of {} items", batch.len());
        Ok(())
      }
    }))
    .await
  {
    tracing::error!(error = %err, "failed to start queue");
    return;
  }

  let rejected = Arc::new(AtomicU64::new(0));
  let mut producers = vec![];
  for p in 0..args.producers {
    let sender = queue.sender();
    let rejected = rejected.clone();
    let items = args.items;
    producers.push(tokio::spawn(async move {
      for i in 0..items {
        let mut item = u64::from(p) * 1_000_000 + u64::from(i);
        // back off and retry until the queue has room again
        loop {
          match sender.send(item).await {
            Ok(()) => break,
            Err(SendError::Timeout { element, .. }) => {
              rejected.fetch_add(1, Ordering::Relaxed);
              item = element;
              sleep(Duration::from_millis(5)).await;
            }
            Err(err) => {
              tracing::warn!(error = %err, "producer {} gives up", p);
              return;
            }
          }
        }
      }
    }));
  }
  for producer in producers {
    let _ = producer.await;
  }

  if !latch.wait_timeout(Duration::from_secs(60)).await {
    tracing::warn!("Gave up waiting, {} items still pending", latch.count().await);
  }
  let outcome = queue.stop().await;
  tracing::info!(
    "Delivered {} items, {} sends hit backpressure, stats = {:?}, outcome = {:?}",
    delivered.load(Ordering::Relaxed),
    rejected.load(Ordering::Relaxed),
    queue.stats(),
    outcome
  );
}
