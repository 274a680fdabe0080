use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde_json::Map;
use serde_json::Value;
use tracing::trace;

use super::Dependency;
use super::Dogu;
use crate::FormatError;

const DEPENDENCY_FIELDS: [&str; 2] = ["Dependencies", "OptionalDependencies"];

/// Descriptor schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Legacy schema; dependencies are plain dogu names
    V1,
    /// Current schema; dependencies carry type and version constraint
    V2,
}

impl fmt::Display for FormatVersion {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            FormatVersion::V1 => write!(f, "v1"),
            FormatVersion::V2 => write!(f, "v2"),
        }
    }
}

/// Serializes descriptors in one schema generation.
pub trait DoguFormatProvider: Send + Sync + 'static {
    fn version(&self) -> FormatVersion;

    fn read_dogu(
        &self,
        raw: &str,
    ) -> Result<Dogu, FormatError>;

    fn write_dogu(
        &self,
        dogu: &Dogu,
    ) -> Result<String, FormatError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoguV2Format;

impl DoguFormatProvider for DoguV2Format {
    fn version(&self) -> FormatVersion {
        FormatVersion::V2
    }

    fn read_dogu(
        &self,
        raw: &str,
    ) -> Result<Dogu, FormatError> {
        serde_json::from_str(raw).map_err(|source| FormatError::Parse {
            version: FormatVersion::V2,
            source,
        })
    }

    fn write_dogu(
        &self,
        dogu: &Dogu,
    ) -> Result<String, FormatError> {
        serde_json::to_string(dogu).map_err(|source| FormatError::Write {
            name: dogu.name.clone(),
            version: FormatVersion::V2,
            source,
        })
    }
}

/// Legacy schema. Dependency version constraints and types are not
/// representable and get lost on write; read dependencies become dogu
/// dependencies without constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoguV1Format;

impl DoguFormatProvider for DoguV1Format {
    fn version(&self) -> FormatVersion {
        FormatVersion::V1
    }

    fn read_dogu(
        &self,
        raw: &str,
    ) -> Result<Dogu, FormatError> {
        let parse_error = |source| FormatError::Parse {
            version: FormatVersion::V1,
            source,
        };

        let mut document: Map<String, Value> = serde_json::from_str(raw).map_err(parse_error)?;
        for field in DEPENDENCY_FIELDS {
            if let Some(Value::Array(entries)) = document.get_mut(field) {
                for entry in entries.iter_mut() {
                    let Value::String(name) = entry else {
                        return Err(parse_error(serde_json::Error::custom(format!(
                            "{field} entries must be dogu names"
                        ))));
                    };
                    let dependency = Dependency::dogu(name.as_str(), "");
                    *entry = serde_json::to_value(dependency).map_err(parse_error)?;
                }
            }
        }

        serde_json::from_value(Value::Object(document)).map_err(parse_error)
    }

    fn write_dogu(
        &self,
        dogu: &Dogu,
    ) -> Result<String, FormatError> {
        let write_error = |source| FormatError::Write {
            name: dogu.name.clone(),
            version: FormatVersion::V1,
            source,
        };

        let mut document = serde_json::to_value(dogu).map_err(write_error)?;
        if let Value::Object(fields) = &mut document {
            fields.insert(
                "Dependencies".to_string(),
                dependency_names(&dogu.dependencies),
            );
            fields.insert(
                "OptionalDependencies".to_string(),
                dependency_names(&dogu.optional_dependencies),
            );
            for field in DEPENDENCY_FIELDS {
                if fields.get(field).is_some_and(|v| v.as_array().is_some_and(Vec::is_empty)) {
                    fields.remove(field);
                }
            }
        }
        serde_json::to_string(&document).map_err(write_error)
    }
}

fn dependency_names(dependencies: &[Dependency]) -> Value {
    Value::Array(
        dependencies
            .iter()
            .map(|d| Value::String(d.name.clone()))
            .collect(),
    )
}

/// Ordered list of providers tried one after another when reading.
///
/// The first successful parse wins. When every provider fails the first
/// provider's error is reported.
#[derive(Clone)]
pub struct DoguFormatDispatcher {
    providers: Vec<Arc<dyn DoguFormatProvider>>,
}

impl DoguFormatDispatcher {
    pub fn new(providers: Vec<Arc<dyn DoguFormatProvider>>) -> Self {
        Self { providers }
    }

    pub fn versions(&self) -> Vec<FormatVersion> {
        self.providers.iter().map(|p| p.version()).collect()
    }

    pub fn read_dogu(
        &self,
        raw: &str,
    ) -> Result<Dogu, FormatError> {
        let mut first_error = None;
        for provider in &self.providers {
            match provider.read_dogu(raw) {
                Ok(dogu) => return Ok(dogu),
                Err(e) => {
                    trace!(version = %provider.version(), error = %e, "dogu format did not match");
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or(FormatError::NoProviders))
    }
}

impl Default for DoguFormatDispatcher {
    /// Current schema first, legacy second.
    fn default() -> Self {
        Self::new(vec![Arc::new(DoguV2Format), Arc::new(DoguV1Format)])
    }
}
