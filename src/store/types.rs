use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Change kind reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Get,
    Set,
    Create,
    Update,
    Delete,
    Expire,
    CompareAndSwap,
    CompareAndDelete,
}

/// One key or directory as returned by the store.
///
/// The store root has an empty `key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreNode {
    #[serde(default)]
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default)]
    pub dir: bool,

    /// Children; only populated for directories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<StoreNode>,

    /// Remaining lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,

    #[serde(default)]
    pub created_index: u64,

    #[serde(default)]
    pub modified_index: u64,
}

impl StoreNode {
    /// Value of a key; empty for directories.
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub action: Action,

    #[serde(default)]
    pub node: StoreNode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_node: Option<StoreNode>,

    /// Store index when the response was produced (`X-Etcd-Index`)
    #[serde(skip)]
    pub index: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Include all descendants instead of only immediate children
    pub recursive: bool,
    /// Order children by key
    pub sorted: bool,
}

impl GetOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            sorted: true,
        }
    }
}

/// Precondition on the existence of the key being written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrevExist {
    #[default]
    Ignore,
    MustExist,
    MustNotExist,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Lifetime after which the store removes the key
    pub ttl: Option<Duration>,
    /// Only reset the lifetime, keep the value and do not notify watchers
    pub refresh: bool,
    pub prev_exist: PrevExist,
    /// Create a directory instead of a key
    pub dir: bool,
}

impl SetOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn refresh(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            refresh: true,
            prev_exist: PrevExist::MustExist,
            dir: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Remove a directory together with everything below it
    pub recursive: bool,
    /// Allow removing an empty directory
    pub dir: bool,
}

impl DeleteOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            dir: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitOptions {
    /// Also report changes below the key
    pub recursive: bool,
    /// Report the first change with an index greater than this; 0 waits for the next change
    pub after_index: u64,
}
