use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::ResilientClient;
use crate::Result;
use crate::ResultExt;
use crate::Watcher;

/// Unscoped store access for change subscriptions.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatchConfigurationContext: Send + Sync + 'static {
    /// Subscribes to changes of `key`, and of its descendants when
    /// `recursive`, until `token` is cancelled.
    fn watch(
        &self,
        key: &str,
        recursive: bool,
        token: CancellationToken,
    ) -> Watcher;

    async fn get(
        &self,
        key: &str,
    ) -> Result<String>;

    /// Full paths of the immediate children; empty when `key` is absent.
    async fn get_children_paths(
        &self,
        key: &str,
    ) -> Result<Vec<String>>;
}

#[derive(Clone)]
pub struct StoreWatchContext {
    client: ResilientClient,
}

impl StoreWatchContext {
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WatchConfigurationContext for StoreWatchContext {
    fn watch(
        &self,
        key: &str,
        recursive: bool,
        token: CancellationToken,
    ) -> Watcher {
        self.client.watch(key, recursive, token)
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<String> {
        self.client
            .get(key)
            .await
            .with_context(|| format!("could not get value of {key}"))
    }

    async fn get_children_paths(
        &self,
        key: &str,
    ) -> Result<Vec<String>> {
        self.client
            .get_children_paths(key)
            .await
            .with_context(|| format!("could not list children of {key}"))
    }
}
