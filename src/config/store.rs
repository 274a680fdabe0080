use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Coordination store connection parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URLs of the store members, e.g. `http://etcd.ecosystem.local:4001`
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Upper bound for a single request attempt (unit: milliseconds).
    /// Long-poll watch requests are not limited by it.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "store.endpoints must contain at least one endpoint".into(),
            )));
        }

        if let Some(endpoint) = self.endpoints.iter().find(|e| e.trim().is_empty()) {
            return Err(Error::Config(ConfigError::Message(format!(
                "store.endpoints contains an empty endpoint: {endpoint:?}"
            ))));
        }

        if self.request_timeout_ms < 1 {
            return Err(Error::Config(ConfigError::Message(
                "store.request_timeout_ms must be at least 1ms".into(),
            )));
        }

        Ok(())
    }
}

/// Watch subscription parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Capacity of the event channel handed to the subscriber.
    /// A full channel pauses the subscription until the subscriber catches up.
    #[serde(default = "default_watch_buffer_size")]
    pub buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_watch_buffer_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "watch.buffer_size must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_endpoints() -> Vec<String> {
    vec!["http://127.0.0.1:4001".to_string()]
}
fn default_request_timeout_ms() -> u64 {
    3000
}
fn default_watch_buffer_size() -> usize {
    64
}
