use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::utils::path::join_path;
use crate::Error;
use crate::ResilientClient;
use crate::Result;
use crate::ResultExt;

/// Key-value operations scoped below one parent path.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigurationContext: Send + Sync + 'static {
    /// Upserts `key`.
    async fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()>;

    /// Upserts `key`; the store removes it after `ttl_seconds` unless refreshed.
    ///
    /// # Errors
    /// `Error::InvalidTtl` if `ttl_seconds` is not positive.
    async fn set_with_lifetime(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: i64,
    ) -> Result<()>;

    /// Resets the lifetime of an existing key without touching its value.
    async fn refresh(
        &self,
        key: &str,
        ttl_seconds: i64,
    ) -> Result<()>;

    /// # Errors
    /// Not found (see [`crate::is_key_not_found`]) if `key` is absent.
    async fn get(
        &self,
        key: &str,
    ) -> Result<String>;

    /// Every value below the parent, keyed by its path relative to the parent.
    async fn get_all(&self) -> Result<BTreeMap<String, String>>;

    /// Removes a single key; directories are rejected.
    async fn delete(
        &self,
        key: &str,
    ) -> Result<()>;

    /// Removes `key` and everything below it.
    async fn delete_recursive(
        &self,
        key: &str,
    ) -> Result<()>;

    async fn exists(
        &self,
        key: &str,
    ) -> Result<bool>;

    /// Removes the whole namespace, the parent included.
    async fn remove_all(&self) -> Result<()>;

    /// `(false, "")` when `key` is absent, `(true, value)` otherwise. A
    /// present key with an empty value yields `(true, "")`.
    async fn get_or_false(
        &self,
        key: &str,
    ) -> Result<(bool, String)>;
}

/// [`ConfigurationContext`] backed by the resilient store client.
#[derive(Clone)]
pub struct StoreConfigurationContext {
    parent: String,
    client: ResilientClient,
}

impl StoreConfigurationContext {
    pub fn new(
        parent: impl Into<String>,
        client: ResilientClient,
    ) -> Self {
        Self {
            parent: parent.into(),
            client,
        }
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    fn key(
        &self,
        key: &str,
    ) -> String {
        join_path(&self.parent, key)
    }
}

fn lifetime(
    key: &str,
    ttl_seconds: i64,
) -> Result<Duration> {
    if ttl_seconds <= 0 {
        return Err(Error::InvalidTtl {
            key: key.to_string(),
            ttl_seconds,
        });
    }
    Ok(Duration::from_secs(ttl_seconds as u64))
}

#[async_trait]
impl ConfigurationContext for StoreConfigurationContext {
    async fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let path = self.key(key);
        self.client
            .set(&path, value)
            .await
            .with_context(|| format!("could not set {path}"))?;
        Ok(())
    }

    async fn set_with_lifetime(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: i64,
    ) -> Result<()> {
        let path = self.key(key);
        let ttl = lifetime(&path, ttl_seconds)?;
        self.client
            .set_with_ttl(&path, value, ttl)
            .await
            .with_context(|| format!("could not set {path} with lifetime {ttl_seconds}s"))?;
        Ok(())
    }

    async fn refresh(
        &self,
        key: &str,
        ttl_seconds: i64,
    ) -> Result<()> {
        let path = self.key(key);
        let ttl = lifetime(&path, ttl_seconds)?;
        self.client
            .refresh(&path, ttl)
            .await
            .with_context(|| format!("could not refresh {path}"))
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<String> {
        let path = self.key(key);
        self.client
            .get(&path)
            .await
            .with_context(|| format!("could not get value of {path}"))
    }

    async fn get_all(&self) -> Result<BTreeMap<String, String>> {
        self.client
            .get_recursive(&self.parent)
            .await
            .with_context(|| format!("could not read values below {}", self.parent))
    }

    async fn delete(
        &self,
        key: &str,
    ) -> Result<()> {
        let path = self.key(key);
        self.client
            .delete(&path)
            .await
            .with_context(|| format!("could not delete {path}"))
    }

    async fn delete_recursive(
        &self,
        key: &str,
    ) -> Result<()> {
        let path = self.key(key);
        self.client
            .delete_recursive(&path)
            .await
            .with_context(|| format!("could not delete {path} recursively"))
    }

    async fn exists(
        &self,
        key: &str,
    ) -> Result<bool> {
        let path = self.key(key);
        self.client
            .exists(&path)
            .await
            .with_context(|| format!("could not check existence of {path}"))
    }

    async fn remove_all(&self) -> Result<()> {
        debug!(parent = %self.parent, "removing namespace");
        self.client
            .delete_recursive(&self.parent)
            .await
            .with_context(|| format!("could not remove {}", self.parent))
    }

    async fn get_or_false(
        &self,
        key: &str,
    ) -> Result<(bool, String)> {
        if !self.exists(key).await? {
            return Ok((false, String::new()));
        }

        match self.get(key).await {
            Ok(value) => Ok((true, value)),
            // removed between the two reads
            Err(e) if e.is_not_found() => Ok((false, String::new())),
            Err(e) => Err(e),
        }
    }
}
