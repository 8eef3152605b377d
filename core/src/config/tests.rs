use std::str::FromStr;
use std::time::Duration;

use rstest::rstest;

use crate::config::*;

#[rstest]
#[case("array", StoreKind::BoundedArray)]
#[case("ARRAY", StoreKind::BoundedArray)]
#[case("bounded_array", StoreKind::BoundedArray)]
#[case("linked", StoreKind::UnboundedLinked)]
#[case("Linked", StoreKind::UnboundedLinked)]
#[case("transfer", StoreKind::SynchronousTransfer)]
#[case("synchronous_transfer", StoreKind::SynchronousTransfer)]
fn test_store_kind_from_str(#[case] raw: &str, #[case] expected: StoreKind) {
  assert_eq!(StoreKind::from_str(raw).unwrap(), expected);
}

#[test]
fn test_store_kind_display_is_its_short_name() {
  assert_eq!(StoreKind::BoundedArray.to_string(), "array");
  assert_eq!(StoreKind::UnboundedLinked.to_string(), "linked");
  assert_eq!(StoreKind::SynchronousTransfer.to_string(), "transfer");
  assert!(StoreKind::from_str("ring").is_err());
}

#[test]
fn test_queue_defaults() {
  let defaults = QueueDefaults::default();
  assert_eq!(defaults.batch_size, 1000);
  assert_eq!(defaults.capacity, 10_000);
  assert_eq!(defaults.poll_wait, Duration::from_millis(15));
  assert_eq!(defaults.enqueue_timeout, Duration::from_millis(1000));
  assert_eq!(defaults.store_kind, StoreKind::BoundedArray);
  assert!(!defaults.try_transfer);
  assert!(!defaults.check_if_busy);
  assert_eq!(defaults.check_every, 100);
  assert_eq!(defaults.shutdown_grace, Duration::from_secs(5));
}

#[test]
fn test_map_property_source_typed_lookups() {
  let source = MapPropertySource::new()
    .with(KEY_BATCH_SIZE, 20)
    .with(KEY_CHECK_IF_BUSY, "TRUE")
    .with(KEY_STORE_KIND, "linked");

  assert_eq!(source.get_integer(KEY_BATCH_SIZE, 1), 20);
  assert_eq!(source.get_integer(KEY_CHECK_EVERY, 7), 7);
  assert!(source.get_boolean(KEY_CHECK_IF_BUSY, false));
  assert_eq!(
    source.get_typed(KEY_STORE_KIND, StoreKind::BoundedArray),
    StoreKind::UnboundedLinked
  );
}

#[test]
fn test_map_property_source_full_keys() {
  let source: MapPropertySource = [("batchq.queue.builder.size", "-1"), ("other.size", "5")]
    .into_iter()
    .collect();
  assert_eq!(source.get_property(KEY_SIZE), Some("-1".to_string()));
  assert_eq!(source.get_integer(KEY_SIZE, 3), -1);
}

#[test]
fn test_unparsable_values_fall_back_to_default() {
  let source = MapPropertySource::new()
    .with(KEY_BATCH_SIZE, "lots")
    .with(KEY_TRY_TRANSFER, "maybe")
    .with(KEY_STORE_KIND, "ring");

  assert_eq!(source.get_integer(KEY_BATCH_SIZE, 42), 42);
  assert!(source.get_boolean(KEY_TRY_TRANSFER, true));
  assert_eq!(
    source.get_typed(KEY_STORE_KIND, StoreKind::SynchronousTransfer),
    StoreKind::SynchronousTransfer
  );
}

#[rstest]
#[case(KEY_BATCH_SIZE, "BATCHQ_QUEUE_BUILDER_BATCH_SIZE")]
#[case(KEY_POLL_WAIT_MS, "BATCHQ_QUEUE_BUILDER_POLL_WAIT_MS")]
#[case(KEY_SIZE, "BATCHQ_QUEUE_BUILDER_SIZE")]
#[case(KEY_CHECK_IF_BUSY, "BATCHQ_QUEUE_BUILDER_CHECK_IF_BUSY")]
#[case(KEY_SHUTDOWN_GRACE_MS, "BATCHQ_QUEUE_BUILDER_SHUTDOWN_GRACE_MS")]
fn test_env_variable_names(#[case] key: &str, #[case] expected: &str) {
  assert_eq!(EnvPropertySource::new().variable_name(key), expected);
}

#[test]
fn test_env_property_source_reads_environment() {
  let source = EnvPropertySource::with_prefix("BATCHQ_CONFIG_TEST_");
  std::env::set_var("BATCHQ_CONFIG_TEST_ENQUEUE_TIMEOUT_MS", "250");
  assert_eq!(source.get_integer(KEY_ENQUEUE_TIMEOUT_MS, 0), 250);
  assert_eq!(source.get_property(KEY_CHECK_EVERY), None);
  std::env::remove_var("BATCHQ_CONFIG_TEST_ENQUEUE_TIMEOUT_MS");
}

#[test]
fn test_defaults_from_source_overlay_only_present_keys() {
  let source = MapPropertySource::new()
    .with(KEY_BATCH_SIZE, 50)
    .with(KEY_POLL_WAIT_MS, 3)
    .with(KEY_SIZE, -1)
    .with(KEY_STORE_KIND, "transfer")
    .with(KEY_TRY_TRANSFER, true)
    .with(KEY_SHUTDOWN_GRACE_MS, -10);

  let defaults = QueueDefaults::from_source(&source, QueueDefaults::default());
  assert_eq!(defaults.batch_size, 50);
  assert_eq!(defaults.poll_wait, Duration::from_millis(3));
  assert_eq!(defaults.capacity, UNBOUNDED_CAPACITY);
  assert_eq!(defaults.store_kind, StoreKind::SynchronousTransfer);
  assert!(defaults.try_transfer);
  assert_eq!(defaults.shutdown_grace, Duration::ZERO);
  assert_eq!(defaults.enqueue_timeout, DEFAULT_ENQUEUE_TIMEOUT);
  assert_eq!(defaults.check_every, DEFAULT_CHECK_EVERY);
}
