use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::str::FromStr;

pub const KEY_BATCH_SIZE: &str = "batchSize";
pub const KEY_POLL_WAIT_MS: &str = "pollWaitMs";
pub const KEY_ENQUEUE_TIMEOUT_MS: &str = "enqueueTimeoutMs";
pub const KEY_CHECK_EVERY: &str = "checkEvery";
pub const KEY_SIZE: &str = "size";
pub const KEY_CHECK_IF_BUSY: &str = "checkIfBusy";
pub const KEY_TRY_TRANSFER: &str = "tryTransfer";
pub const KEY_STORE_KIND: &str = "storeKind";
pub const KEY_SHUTDOWN_GRACE_MS: &str = "shutdownGraceMs";

pub const MAP_KEY_PREFIX: &str = "batchq.queue.builder.";
pub const ENV_KEY_PREFIX: &str = "BATCHQ_QUEUE_BUILDER_";

/// A source of raw configuration values, looked up by short key (`batchSize`, `size`, ...).
pub trait PropertySource: Debug + Send + Sync {
  fn get_property(&self, key: &str) -> Option<String>;

  fn get_integer(&self, key: &str, default: i64) -> i64 {
    self.get_typed(key, default)
  }

  /// Accepts `true`/`false` in any case as well as `1`/`0`.
  fn get_boolean(&self, key: &str, default: bool) -> bool {
    match self.get_property(key) {
      None => default,
      Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => {
          tracing::warn!(key, value = %raw, "unparsable boolean property, using default");
          default
        }
      },
    }
  }

  fn get_typed<T>(&self, key: &str, default: T) -> T
  where
    T: FromStr,
    T::Err: Display, {
    match self.get_property(key) {
      None => default,
      Some(raw) => match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(err) => {
          tracing::warn!(key, value = %raw, error = %err, "unparsable property, using default");
          default
        }
      },
    }
  }
}

/// In-memory key/value properties. Keys are stored in full, e.g. `batchq.queue.builder.batchSize`.
#[derive(Debug, Clone)]
pub struct MapPropertySource {
  prefix: String,
  values: HashMap<String, String>,
}

impl MapPropertySource {
  pub fn new() -> Self {
    Self::with_prefix(MAP_KEY_PREFIX)
  }

  pub fn with_prefix(prefix: impl Into<String>) -> Self {
    Self {
      prefix: prefix.into(),
      values: HashMap::new(),
    }
  }

  /// Sets a value under its full key.
  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.values.insert(key.into(), value.into());
    self
  }

  /// Sets a value under a short key, adding the prefix.
  pub fn with(mut self, short_key: &str, value: impl ToString) -> Self {
    let key = format!("{}{}", self.prefix, short_key);
    self.values.insert(key, value.to_string());
    self
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }
}

impl Default for MapPropertySource {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapPropertySource {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let mut source = MapPropertySource::new();
    for (k, v) in iter {
      source.set(k, v);
    }
    source
  }
}

impl PropertySource for MapPropertySource {
  fn get_property(&self, key: &str) -> Option<String> {
    self.values.get(&format!("{}{}", self.prefix, key)).cloned()
  }
}

/// Reads `BATCHQ_QUEUE_BUILDER_<KEY>` from the process environment.
#[derive(Debug, Clone)]
pub struct EnvPropertySource {
  prefix: String,
}

impl EnvPropertySource {
  pub fn new() -> Self {
    Self::with_prefix(ENV_KEY_PREFIX)
  }

  pub fn with_prefix(prefix: impl Into<String>) -> Self {
    Self { prefix: prefix.into() }
  }

  /// `pollWaitMs` -> `BATCHQ_QUEUE_BUILDER_POLL_WAIT_MS`
  pub fn variable_name(&self, key: &str) -> String {
    let mut name = self.prefix.clone();
    let mut previous_lower = false;
    for c in key.chars() {
      if c.is_ascii_uppercase() && previous_lower {
        name.push('_');
      }
      previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
      name.push(c.to_ascii_uppercase());
    }
    name
  }
}

impl Default for EnvPropertySource {
  fn default() -> Self {
    Self::new()
  }
}

impl PropertySource for EnvPropertySource {
  fn get_property(&self, key: &str) -> Option<String> {
    std::env::var(self.variable_name(key)).ok()
  }
}
