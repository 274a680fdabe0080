use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::DeleteOptions;
use super::GetOptions;
use super::KeysApi;
use super::Response;
use super::SetOptions;
use super::StoreNode;
use super::StoreResult;
use super::Watcher;
use crate::metrics::STORE_ATTEMPTS;
use crate::metrics::STORE_FAILURES;
use crate::metrics::STORE_RETRIES;
use crate::utils::path::normalize_key;
use crate::utils::path::relative_key;
use crate::utils::scoped_timer::ScopedTimer;
use crate::Error;
use crate::ErrorKind;
use crate::RegistrySettings;
use crate::Result;
use crate::RetryPolicy;
use crate::StoreError;
use crate::WatchConfig;

/// Retrying store client shared by every context and registry.
///
/// Each operation runs in a bounded loop driven by the [`RetryPolicy`]
/// backoff sequence: successes and "not found" answers return at once, every
/// other failure sleeps the next delay and tries again until the sequence is
/// exhausted. Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct ResilientClient {
    api: Arc<dyn KeysApi>,
    retry: RetryPolicy,
    request_timeout: Duration,
    watch: WatchConfig,
}

impl ResilientClient {
    pub fn new(
        api: Arc<dyn KeysApi>,
        retry: RetryPolicy,
        request_timeout: Duration,
        watch: WatchConfig,
    ) -> Self {
        Self {
            api,
            retry,
            request_timeout,
            watch,
        }
    }

    pub fn from_settings(
        api: Arc<dyn KeysApi>,
        settings: &RegistrySettings,
    ) -> Self {
        Self::new(
            api,
            settings.retry.clone(),
            settings.store.request_timeout(),
            settings.watch.clone(),
        )
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Value stored at `key`; empty for directories.
    pub async fn get(
        &self,
        key: &str,
    ) -> Result<String> {
        let response = self
            .with_retry("get", key, || self.api.get(key, GetOptions::default()))
            .await?;
        Ok(response.node.value.unwrap_or_default())
    }

    /// Raw node at `key`, with all descendants when `recursive`.
    pub async fn get_node(
        &self,
        key: &str,
        recursive: bool,
    ) -> Result<StoreNode> {
        let opts = GetOptions {
            recursive,
            sorted: true,
        };
        let response = self.with_retry("get_node", key, || self.api.get(key, opts)).await?;
        Ok(response.node)
    }

    /// Upserts `key` and returns the stored value.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<String> {
        let response = self
            .with_retry("set", key, || self.api.set(key, value, SetOptions::default()))
            .await?;
        Ok(response.node.value.unwrap_or_default())
    }

    /// Upserts `key` with a lifetime after which the store removes it.
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<String> {
        let response = self
            .with_retry("set_with_ttl", key, || self.api.set(key, value, SetOptions::with_ttl(ttl)))
            .await?;
        Ok(response.node.value.unwrap_or_default())
    }

    /// Resets the lifetime of an existing key, keeping its value.
    pub async fn refresh(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<()> {
        self.with_retry("refresh", key, || self.api.set(key, "", SetOptions::refresh(ttl)))
            .await?;
        Ok(())
    }

    /// Removes a single key. Directories are rejected by the store.
    pub async fn delete(
        &self,
        key: &str,
    ) -> Result<()> {
        self.with_retry("delete", key, || self.api.delete(key, DeleteOptions::default()))
            .await?;
        Ok(())
    }

    /// Removes `key` and everything below it.
    pub async fn delete_recursive(
        &self,
        key: &str,
    ) -> Result<()> {
        self.with_retry("delete_recursive", key, || {
            self.api.delete(key, DeleteOptions::recursive())
        })
        .await?;
        Ok(())
    }

    /// `false` when the key is absent; errors only when existence could not be
    /// determined.
    pub async fn exists(
        &self,
        key: &str,
    ) -> Result<bool> {
        match self.with_retry("exists", key, || self.api.get(key, GetOptions::default())).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every value below `key`, keyed by its path relative to `key`.
    /// Directories are descended into and never appear as entries.
    pub async fn get_recursive(
        &self,
        key: &str,
    ) -> Result<BTreeMap<String, String>> {
        let response = self
            .with_retry("get_recursive", key, || self.api.get(key, GetOptions::recursive()))
            .await?;

        let root = normalize_key(key);
        let mut values = BTreeMap::new();
        for child in &response.node.nodes {
            flatten(&root, child, &mut values);
        }
        Ok(values)
    }

    /// Full paths of the immediate children of `key`; empty when `key` does
    /// not exist.
    pub async fn get_children_paths(
        &self,
        key: &str,
    ) -> Result<Vec<String>> {
        let opts = GetOptions {
            recursive: false,
            sorted: true,
        };
        match self.with_retry("get_children_paths", key, || self.api.get(key, opts)).await {
            Ok(response) => Ok(response.node.nodes.into_iter().map(|n| n.key).collect()),
            Err(e) if e.is_not_found() => {
                debug!(key, "no children, key does not exist");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Starts a change subscription on `key` that lives until `token` is
    /// cancelled or the returned [`Watcher`] is dropped.
    pub fn watch(
        &self,
        key: &str,
        recursive: bool,
        token: CancellationToken,
    ) -> Watcher {
        let retry_delay = Duration::from_millis(self.retry.interval.max(1) as u64);
        Watcher::spawn(
            self.api.clone(),
            normalize_key(key),
            recursive,
            &token,
            self.watch.buffer_size,
            retry_delay,
        )
    }

    async fn with_retry<F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        mut attempt: F,
    ) -> Result<Response>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<Response>>,
    {
        let mut delays = self.retry.backoff()?.into_iter();
        let _timer = ScopedTimer::new(operation, key);
        let mut attempts = 0;

        loop {
            attempts += 1;
            STORE_ATTEMPTS.with_label_values(&[operation]).inc();

            let error = match timeout(self.request_timeout, attempt()).await {
                Ok(Ok(response)) => {
                    trace!(operation, key, attempts, "store request succeeded");
                    return Ok(response);
                }
                Ok(Err(e)) => e,
                Err(_) => StoreError::Timeout(self.request_timeout),
            };

            let kind = error.kind();
            if kind != ErrorKind::NotFound {
                if let Some(delay) = delays.next() {
                    warn!(operation, key, attempts, ?delay, kind = kind.as_str(), error = %error, "store request failed, retrying");
                    STORE_RETRIES.with_label_values(&[operation]).inc();
                    sleep(delay).await;
                    continue;
                }
            }

            match kind {
                ErrorKind::NotFound => debug!(operation, key, "key not found"),
                _ => warn!(operation, key, attempts, kind = kind.as_str(), error = %error, "store request failed"),
            }
            STORE_FAILURES.with_label_values(&[operation, kind.as_str()]).inc();

            return Err(Error::Store {
                operation,
                key: key.to_string(),
                attempts,
                source: error,
            });
        }
    }
}

fn flatten(
    root: &str,
    node: &StoreNode,
    values: &mut BTreeMap<String, String>,
) {
    if node.dir {
        for child in &node.nodes {
            flatten(root, child, values);
        }
    } else {
        values.insert(
            relative_key(root, &node.key).to_string(),
            node.value_str().to_string(),
        );
    }
}
