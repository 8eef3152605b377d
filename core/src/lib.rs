//! A batching, backpressure-aware queue.
//!
//! Producers push single items through a [`QueueSender`], a dedicated poller task groups them
//! into ordered batches of at most `batch_size` and hands each batch to a [`BatchListener`].
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use batchq_core_rs::{BatchListenerHandle, QueueBuilder, StoreKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = QueueBuilder::default()
//!   .with_name("events")
//!   .with_store_kind(StoreKind::BoundedArray)
//!   .with_capacity(1_000)
//!   .with_batch_size(100)
//!   .with_enqueue_timeout(Duration::from_millis(50))
//!   .build::<String>()?;
//!
//! queue
//!   .start(BatchListenerHandle::from_fn(|batch: Vec<String>| async move {
//!     println!("got {} events", batch.len());
//!     Ok(())
//!   }))
//!   .await?;
//!
//! queue.sender().send("hello".to_string()).await?;
//! queue.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod config_option;
pub mod error;
pub mod listener;
pub mod poller;
pub mod queue;
pub mod sender;
pub mod store;

pub use builder::*;
pub use config::*;
pub use config_option::*;
pub use error::*;
pub use listener::*;
pub use poller::{PollerState, PollerStats, BUSY_HIGH_WATER, BUSY_LOW_WATER, BUSY_POLL_WAIT};
pub use queue::*;
pub use sender::*;
pub use store::*;

pub use batchq_utils_rs::collections::{Element, QueueSize};
