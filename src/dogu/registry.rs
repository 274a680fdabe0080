use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;
use tracing::warn;

use super::simple_name;
use super::Dogu;
use super::DoguFormatDispatcher;
use super::DoguFormatProvider;
use super::FormatVersion;
use crate::constants::CURRENT_KEY;
use crate::utils::path::join_path;
use crate::utils::path::last_segment;
use crate::ResilientClient;
use crate::Result;
use crate::ResultExt;

/// Versioned dogu descriptors with an active-version pointer per dogu.
///
/// Names may be given qualified (`official/nginx`) or simple (`nginx`).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DoguRegistry: Send + Sync + 'static {
    /// Stores the descriptor body for its version without activating it.
    async fn register(
        &self,
        dogu: &Dogu,
    ) -> Result<()>;

    /// Makes the descriptor's version the active one.
    async fn enable(
        &self,
        dogu: &Dogu,
    ) -> Result<()>;

    /// Active descriptor of a dogu.
    ///
    /// # Errors
    /// Not found when the dogu has no active version or its body is missing.
    async fn get(
        &self,
        name: &str,
    ) -> Result<Dogu>;

    /// Active descriptors of all dogus; unreadable entries are skipped.
    async fn get_all(&self) -> Result<Vec<Dogu>>;

    /// Removes the active-version pointer. Version bodies stay.
    async fn unregister(
        &self,
        name: &str,
    ) -> Result<()>;

    async fn is_enabled(
        &self,
        name: &str,
    ) -> Result<bool>;
}

/// [`DoguRegistry`] below one store root, writing one schema generation.
pub struct StoreDoguRegistry {
    client: ResilientClient,
    root: String,
    format: Arc<dyn DoguFormatProvider>,
    reader: DoguFormatDispatcher,
}

impl StoreDoguRegistry {
    pub fn new(
        client: ResilientClient,
        root: impl Into<String>,
        format: Arc<dyn DoguFormatProvider>,
        reader: DoguFormatDispatcher,
    ) -> Self {
        Self {
            client,
            root: root.into(),
            format,
            reader,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn format_version(&self) -> FormatVersion {
        self.format.version()
    }

    fn dogu_key(
        &self,
        name: &str,
    ) -> String {
        join_path(&self.root, simple_name(name))
    }

    fn current_key(
        &self,
        name: &str,
    ) -> String {
        join_path(&self.dogu_key(name), CURRENT_KEY)
    }
}

#[async_trait]
impl DoguRegistry for StoreDoguRegistry {
    async fn register(
        &self,
        dogu: &Dogu,
    ) -> Result<()> {
        let body = self.format.write_dogu(dogu)?;
        let key = join_path(&self.dogu_key(dogu.simple_name()), &dogu.version);
        debug!(dogu = %dogu.name, version = %dogu.version, %key, "registering dogu");

        self.client
            .set(&key, &body)
            .await
            .with_context(|| format!("failed to register dogu {} {}", dogu.name, dogu.version))?;
        Ok(())
    }

    async fn enable(
        &self,
        dogu: &Dogu,
    ) -> Result<()> {
        let key = self.current_key(dogu.simple_name());
        debug!(dogu = %dogu.name, version = %dogu.version, %key, "enabling dogu");

        self.client
            .set(&key, &dogu.version)
            .await
            .with_context(|| format!("failed to enable dogu {} {}", dogu.name, dogu.version))?;
        Ok(())
    }

    async fn get(
        &self,
        name: &str,
    ) -> Result<Dogu> {
        let version = self
            .client
            .get(&self.current_key(name))
            .await
            .with_context(|| format!("failed to read current version of dogu {name}"))?;

        let body = self
            .client
            .get(&join_path(&self.dogu_key(name), &version))
            .await
            .with_context(|| format!("failed to read dogu {name} {version}"))?;

        Ok(self.reader.read_dogu(&body)?)
    }

    async fn get_all(&self) -> Result<Vec<Dogu>> {
        let children = self
            .client
            .get_children_paths(&self.root)
            .await
            .with_context(|| format!("failed to list dogus below {}", self.root))?;

        let mut dogus = Vec::with_capacity(children.len());
        for child in &children {
            let name = last_segment(child);
            match self.get(name).await {
                Ok(dogu) => dogus.push(dogu),
                Err(e) => warn!(root = %self.root, dogu = name, error = %e, "skipping unreadable dogu"),
            }
        }
        Ok(dogus)
    }

    async fn unregister(
        &self,
        name: &str,
    ) -> Result<()> {
        self.client
            .delete(&self.current_key(name))
            .await
            .with_context(|| format!("failed to unregister dogu {name}"))
    }

    async fn is_enabled(
        &self,
        name: &str,
    ) -> Result<bool> {
        self.client
            .exists(&self.current_key(name))
            .await
            .with_context(|| format!("failed to check whether dogu {name} is enabled"))
    }
}
