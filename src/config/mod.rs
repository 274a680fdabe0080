//! Configuration management for the registry client.
//!
//! Settings are merged from several sources, later ones winning:
//! 1. Default values (hardcoded)
//! 2. File named by the `CONFIG_PATH` environment variable
//! 3. Explicit override files (`with_override_config`)
//! 4. Environment variables with the `DOGU_REGISTRY__` prefix (highest priority)
//!
//! List values such as `DOGU_REGISTRY__STORE__ENDPOINTS` are comma separated.

mod retry;
mod store;
pub use retry::*;
pub use store::*;

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod retry_test;

//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

pub const ENV_PREFIX: &str = "DOGU_REGISTRY";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RegistrySettings {
    /// Coordination store endpoints and request limits
    #[serde(default)]
    pub store: StoreConfig,

    /// Retry policy for every store operation
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Watch subscription settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl RegistrySettings {
    /// Creates settings from defaults, `CONFIG_PATH` and environment variables.
    ///
    /// Callers MUST call `validate()` before using the settings.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let settings: Self = builder.add_source(environment()).build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies an additional configuration file on top of the current values.
    ///
    /// Environment variables are applied again afterwards so they keep the
    /// highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Loads and validates settings, optionally merging one more file.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = Self::new()?;
        let settings = match path {
            Some(path) => settings.with_override_config(path)?,
            None => settings,
        };
        settings.validate()
    }

    pub fn validate(self) -> Result<Self> {
        self.store.validate()?;
        self.retry.validate()?;
        self.watch.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("store.endpoints")
}
