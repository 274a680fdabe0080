//! Coordination store access.
//!
//! Two layers live here:
//! - [`KeysApi`]: the raw hierarchical keys protocol, one request per call and
//!   no retries. Implemented over HTTP by [`HttpKeysApi`] and in process by
//!   [`MemKeysApi`].
//! - [`ResilientClient`]: the retrying, failure-classifying client every other
//!   module goes through.

mod http_keys_api;
mod mem_keys_api;
mod resilient_client;
mod types;
mod watcher;

pub use http_keys_api::*;
pub use mem_keys_api::*;
pub use resilient_client::*;
pub use types::*;
pub use watcher::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Raw hierarchical key-value protocol of the coordination store.
///
/// Keys are absolute slash separated paths. Implementations report failures
/// with their origin classification (see [`StoreError::kind`]) and never retry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeysApi: Send + Sync + 'static {
    /// Reads a key or a directory listing.
    ///
    /// # Errors
    /// - `StoreError::Api` with code 100 if the key does not exist
    async fn get(
        &self,
        key: &str,
        opts: GetOptions,
    ) -> StoreResult<Response>;

    /// Creates or replaces a key, or refreshes its lifetime.
    ///
    /// Missing parent directories are created.
    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: SetOptions,
    ) -> StoreResult<Response>;

    /// Removes a key, or a directory when `dir`/`recursive` is set.
    async fn delete(
        &self,
        key: &str,
        opts: DeleteOptions,
    ) -> StoreResult<Response>;

    /// Waits for the first change at `key` (or below it when recursive) with an
    /// index greater than `opts.after_index`.
    ///
    /// Not bounded by the request timeout; callers cancel by dropping the future.
    async fn wait(
        &self,
        key: &str,
        opts: WaitOptions,
    ) -> StoreResult<Response>;
}
