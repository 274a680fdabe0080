use serde::Deserialize;
use serde::Serialize;

pub const DEPENDENCY_TYPE_DOGU: &str = "dogu";

/// Application descriptor.
///
/// `name` is qualified with its namespace (`official/nginx`); registries key
/// entries by the simple name only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dogu {
    pub name: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, rename = "Logo", skip_serializing_if = "String::is_empty")]
    pub logo_url: String,

    #[serde(default, rename = "URL", skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_dependencies: Vec<Dependency>,
}

impl Dogu {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// `official/nginx` -> `nginx`
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// `official/nginx` -> `official`; empty without namespace
    pub fn namespace(&self) -> &str {
        self.name.rsplit_once('/').map(|(ns, _)| ns).unwrap_or_default()
    }
}

/// Strips the namespace from a qualified dogu name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit_once('/').map_or(name, |(_, simple)| simple)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "type", default = "default_dependency_type")]
    pub dependency_type: String,

    pub name: String,

    /// Version constraint such as `>=1.2.0`; empty means any version
    #[serde(default)]
    pub version: String,
}

impl Dependency {
    pub fn dogu(
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            dependency_type: default_dependency_type(),
            name: name.into(),
            version: version.into(),
        }
    }
}

fn default_dependency_type() -> String {
    DEPENDENCY_TYPE_DOGU.to_string()
}
