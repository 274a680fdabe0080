//! Per-dogu lifecycle marker used by installers to track progress.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::ResilientClient;
use crate::Result;
use crate::ResultExt;


/// Opaque state string of one dogu.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DoguState: Send + Sync + 'static {
    /// Current state; empty when none was set.
    async fn get(&self) -> Result<String>;

    async fn set(
        &self,
        value: &str,
    ) -> Result<()>;

    /// Clears the state. Clearing an absent state succeeds.
    async fn remove(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct StoreDoguState {
    client: ResilientClient,
    key: String,
}

impl StoreDoguState {
    pub fn new(
        client: ResilientClient,
        key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl DoguState for StoreDoguState {
    async fn get(&self) -> Result<String> {
        match self.client.get(&self.key).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_not_found() => Ok(String::new()),
            Err(e) => Err(e.context(format!("could not read state {}", self.key))),
        }
    }

    async fn set(
        &self,
        value: &str,
    ) -> Result<()> {
        debug!(key = %self.key, value, "setting dogu state");
        self.client
            .set(&self.key, value)
            .await
            .with_context(|| format!("could not set state {}", self.key))?;
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        if !self.client.exists(&self.key).await? {
            return Ok(());
        }
        match self.client.delete(&self.key).await {
            Err(e) if !e.is_not_found() => Err(e.context(format!("could not remove state {}", self.key))),
            _ => Ok(()),
        }
    }
}
