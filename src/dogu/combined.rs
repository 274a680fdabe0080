use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::error;

use super::Dogu;
use super::DoguRegistry;
use super::FormatVersion;
use crate::Error;
use crate::Result;

/// Legacy and current registry roots presented as one.
///
/// Writes go to the legacy root first and then to the current one. A failure
/// of the second write is reported as [`Error::PartialWrite`]; the first write
/// is kept. Reads prefer the current root.
pub struct CombinedDoguRegistry {
    v1: Arc<dyn DoguRegistry>,
    v2: Arc<dyn DoguRegistry>,
}

impl CombinedDoguRegistry {
    pub fn new(
        v1: Arc<dyn DoguRegistry>,
        v2: Arc<dyn DoguRegistry>,
    ) -> Self {
        Self { v1, v2 }
    }

    fn partial_write(
        operation: &'static str,
        dogu: &Dogu,
        source: Error,
    ) -> Error {
        error!(operation, dogu = %dogu.name, error = %source, "dogu written to v1 registry only");
        Error::PartialWrite {
            operation,
            dogu: dogu.name.clone(),
            applied: FormatVersion::V1,
            failed: FormatVersion::V2,
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl DoguRegistry for CombinedDoguRegistry {
    async fn register(
        &self,
        dogu: &Dogu,
    ) -> Result<()> {
        self.v1.register(dogu).await?;
        self.v2
            .register(dogu)
            .await
            .map_err(|e| Self::partial_write("register", dogu, e))
    }

    async fn enable(
        &self,
        dogu: &Dogu,
    ) -> Result<()> {
        self.v1.enable(dogu).await?;
        self.v2
            .enable(dogu)
            .await
            .map_err(|e| Self::partial_write("enable", dogu, e))
    }

    async fn get(
        &self,
        name: &str,
    ) -> Result<Dogu> {
        match self.v2.get(name).await {
            Ok(dogu) => Ok(dogu),
            Err(e) if e.is_not_found() => {
                debug!(dogu = name, "not in v2 registry, falling back to v1");
                self.v1.get(name).await
            }
            Err(e) => Err(e),
        }
    }

    async fn get_all(&self) -> Result<Vec<Dogu>> {
        let mut dogus = self.v2.get_all().await?;
        let known: HashSet<String> = dogus.iter().map(|d| d.simple_name().to_string()).collect();

        let legacy_only: Vec<Dogu> = self
            .v1
            .get_all()
            .await?
            .into_iter()
            .filter(|d| !known.contains(d.simple_name()))
            .collect();
        dogus.extend(legacy_only);

        Ok(dogus)
    }

    async fn unregister(
        &self,
        name: &str,
    ) -> Result<()> {
        self.v1.unregister(name).await?;
        match self.v2.unregister(name).await {
            Err(e) if e.is_not_found() => {
                debug!(dogu = name, "no v2 entry to unregister");
                Ok(())
            }
            other => other,
        }
    }

    /// Answered by the v1 root, which holds every registered dogu.
    async fn is_enabled(
        &self,
        name: &str,
    ) -> Result<bool> {
        self.v1.is_enabled(name).await
    }
}
