//! Registry facade: the single entry point handing out contexts, dogu
//! registries and state markers that all share one store connection.
//!
//! ```no_run
//! use dogu_registry::Registry;
//! use dogu_registry::RegistrySettings;
//! use dogu_registry::StoreRegistry;
//!
//! # async fn run() -> dogu_registry::Result<()> {
//! let settings = RegistrySettings::load(None)?;
//! let registry = StoreRegistry::connect(&settings)?;
//! let fqdn = registry.global_config().get("fqdn").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::constants::BLUEPRINT_KEY;
use crate::constants::DOGU_CONFIG_KEY;
use crate::constants::DOGU_V1_KEY;
use crate::constants::DOGU_V2_KEY;
use crate::constants::GLOBAL_CONFIG_KEY;
use crate::constants::HOST_CONFIG_KEY;
use crate::constants::STATE_KEY;
use crate::utils::path::join_path;
use crate::CombinedDoguRegistry;
use crate::ConfigurationContext;
use crate::DoguFormatDispatcher;
use crate::DoguRegistry;
use crate::DoguState;
use crate::DoguV1Format;
use crate::DoguV2Format;
use crate::Error;
use crate::HttpKeysApi;
use crate::KeysApi;
use crate::NodeTree;
use crate::RegistrySettings;
use crate::ResilientClient;
use crate::Result;
use crate::ResultExt;
use crate::StoreConfigurationContext;
use crate::StoreDoguRegistry;
use crate::StoreDoguState;
use crate::StoreWatchContext;
use crate::WatchConfigurationContext;

#[cfg(test)]
mod registry_test;

/// Everything a component needs from the coordination store.
#[async_trait]
pub trait Registry: Send + Sync {
    /// `/config/_global`
    fn global_config(&self) -> Arc<dyn ConfigurationContext>;

    /// `/config/_host/<service>`
    fn host_config(
        &self,
        service: &str,
    ) -> Arc<dyn ConfigurationContext>;

    /// `/config/<dogu>`
    fn dogu_config(
        &self,
        dogu: &str,
    ) -> Arc<dyn ConfigurationContext>;

    /// `/state/<dogu>`
    fn state(
        &self,
        dogu: &str,
    ) -> Arc<dyn DoguState>;

    /// Combined `/dogu` + `/dogu_v2` registry
    fn dogu_registry(&self) -> Arc<dyn DoguRegistry>;

    /// `/blueprint`
    fn blueprint_registry(&self) -> Arc<dyn ConfigurationContext>;

    /// Unscoped access for watching
    fn root_config(&self) -> Arc<dyn WatchConfigurationContext>;

    /// Snapshot of the whole store as a tree.
    async fn get_node(&self) -> Result<NodeTree>;
}

/// [`Registry`] over one [`ResilientClient`].
#[derive(Clone)]
pub struct StoreRegistry {
    client: ResilientClient,
    dogu_registry: Arc<CombinedDoguRegistry>,
}

impl StoreRegistry {
    /// Connects to the configured store endpoints over HTTP.
    pub fn connect(settings: &RegistrySettings) -> Result<Self> {
        settings.store.validate()?;
        settings.retry.validate()?;
        let api = HttpKeysApi::new(&settings.store).map_err(|source| Error::Store {
            operation: "connect",
            key: String::new(),
            attempts: 0,
            source,
        })?;
        debug!(endpoints = ?settings.store.endpoints, "registry connected");
        Ok(Self::with_keys_api(Arc::new(api), settings))
    }

    /// Builds the registry on any raw store implementation.
    pub fn with_keys_api(
        api: Arc<dyn KeysApi>,
        settings: &RegistrySettings,
    ) -> Self {
        let client = ResilientClient::from_settings(api, settings);
        let reader = DoguFormatDispatcher::default();
        let v1 = StoreDoguRegistry::new(client.clone(), DOGU_V1_KEY, Arc::new(DoguV1Format), reader.clone());
        let v2 = StoreDoguRegistry::new(client.clone(), DOGU_V2_KEY, Arc::new(DoguV2Format), reader);

        Self {
            client,
            dogu_registry: Arc::new(CombinedDoguRegistry::new(Arc::new(v1), Arc::new(v2))),
        }
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    fn context(
        &self,
        parent: String,
    ) -> Arc<dyn ConfigurationContext> {
        Arc::new(StoreConfigurationContext::new(parent, self.client.clone()))
    }
}

#[async_trait]
impl Registry for StoreRegistry {
    fn global_config(&self) -> Arc<dyn ConfigurationContext> {
        self.context(GLOBAL_CONFIG_KEY.to_string())
    }

    fn host_config(
        &self,
        service: &str,
    ) -> Arc<dyn ConfigurationContext> {
        self.context(join_path(HOST_CONFIG_KEY, service))
    }

    fn dogu_config(
        &self,
        dogu: &str,
    ) -> Arc<dyn ConfigurationContext> {
        self.context(join_path(DOGU_CONFIG_KEY, dogu))
    }

    fn state(
        &self,
        dogu: &str,
    ) -> Arc<dyn DoguState> {
        Arc::new(StoreDoguState::new(self.client.clone(), join_path(STATE_KEY, dogu)))
    }

    fn dogu_registry(&self) -> Arc<dyn DoguRegistry> {
        self.dogu_registry.clone()
    }

    fn blueprint_registry(&self) -> Arc<dyn ConfigurationContext> {
        self.context(BLUEPRINT_KEY.to_string())
    }

    fn root_config(&self) -> Arc<dyn WatchConfigurationContext> {
        Arc::new(StoreWatchContext::new(self.client.clone()))
    }

    async fn get_node(&self) -> Result<NodeTree> {
        let root = self
            .client
            .get_node("/", true)
            .await
            .with_context(|| "could not read store tree")?;
        Ok(NodeTree::from_store_node(&root))
    }
}
