//! Registry Error Hierarchy
//!
//! Every failure is classified once, where it originates, into an [`ErrorKind`]:
//! the store decides whether a key is absent, whether the failure lies in
//! the connection, or whether the store rejected the request. Wrapping layers
//! (resilient client, configuration contexts, dogu registries) add the
//! operation and key path but always delegate [`Error::kind`] to the wrapped
//! error, so the classification survives every wrap.

use std::error::Error as StdError;
use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;

use crate::dogu::FormatVersion;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Classification used by callers that need to tell "legitimately absent"
/// apart from "failed to determine", and as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The key (or one of its parents) does not exist
    NotFound,
    /// The request may succeed if repeated
    Transient,
    /// Rejected by the store itself (bad request, auth, conflicts). Still
    /// retried by the store client; watches stop on it.
    Permanent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store operation failed, after `attempts` tries
    #[error("{operation} {key} failed after {attempts} attempt(s): {source}")]
    Store {
        operation: &'static str,
        key: String,
        attempts: usize,
        #[source]
        source: StoreError,
    },

    /// Negative interval or retry count, rejected before any request is sent
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// Time to live that cannot be expressed as a store lease
    #[error("Invalid time to live for {key}: {ttl_seconds}s")]
    InvalidTtl { key: String, ttl_seconds: i64 },

    /// Dogu descriptor could not be read or written
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A dual-schema write reached one registry root but not the other.
    /// The applied side is not rolled back.
    #[error("{operation} of dogu {dogu} applied to {applied} registry but failed on {failed}: {source}")]
    PartialWrite {
        operation: &'static str,
        dogu: String,
        applied: FormatVersion,
        failed: FormatVersion,
        #[source]
        source: Box<Error>,
    },

    /// Settings loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Contextual wrap added at a layer boundary
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Classification of this error, looking through contextual wraps.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Store { source, .. } => source.kind(),
            Error::PartialWrite { source, .. } => source.kind(),
            Error::Context { source, .. } => source.kind(),
            Error::InvalidRetryPolicy(_) | Error::InvalidTtl { .. } | Error::Format(_) | Error::Config(_) => {
                ErrorKind::Permanent
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Wraps the error with layer context, keeping its classification.
    pub fn context(
        self,
        context: impl Into<String>,
    ) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Adds [`Error::context`] to results.
pub trait ResultExt<T> {
    fn with_context<F, S>(
        self,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F, S>(
        self,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

/// Failures of a single raw store request.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Error document returned by the store itself
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Connection level failure against one endpoint
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Attempt exceeded the configured request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status without an error document
    #[error("Unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// Body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No store endpoints configured")]
    NoEndpoints,

    /// Endpoint that cannot be turned into a request URL
    #[error("Invalid store endpoint {0}")]
    InvalidEndpoint(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Api(e) => e.kind(),
            StoreError::Status { status, .. } if *status == 401 || *status == 403 => ErrorKind::Permanent,
            StoreError::NoEndpoints | StoreError::InvalidEndpoint(_) => ErrorKind::Permanent,
            StoreError::Transport { .. }
            | StoreError::Timeout(_)
            | StoreError::Status { .. }
            | StoreError::InvalidResponse(_) => ErrorKind::Transient,
        }
    }
}

pub const CODE_KEY_NOT_FOUND: u32 = 100;
pub const CODE_TEST_FAILED: u32 = 101;
pub const CODE_NOT_FILE: u32 = 102;
pub const CODE_NOT_DIR: u32 = 104;
pub const CODE_NODE_EXIST: u32 = 105;
pub const CODE_ROOT_READ_ONLY: u32 = 107;
pub const CODE_DIR_NOT_EMPTY: u32 = 108;
pub const CODE_UNAUTHORIZED: u32 = 110;
pub const CODE_TTL_NAN: u32 = 202;
pub const CODE_EVENT_INDEX_CLEARED: u32 = 401;

/// Error document as sent by the store: `{errorCode, message, cause, index}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("{message} ({cause}) [code {error_code}, index {index}]")]
pub struct ApiError {
    #[serde(rename = "errorCode")]
    pub error_code: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub index: u64,
}

impl ApiError {
    pub fn new(
        error_code: u32,
        cause: impl Into<String>,
        index: u64,
    ) -> Self {
        let message = match error_code {
            CODE_KEY_NOT_FOUND => "Key not found",
            CODE_TEST_FAILED => "Compare failed",
            CODE_NOT_FILE => "Not a file",
            CODE_NOT_DIR => "Not a directory",
            CODE_NODE_EXIST => "Key already exists",
            CODE_ROOT_READ_ONLY => "Root is read only",
            CODE_DIR_NOT_EMPTY => "Directory not empty",
            CODE_UNAUTHORIZED => "The request requires user authentication",
            CODE_TTL_NAN => "The given TTL in POST form is not a number",
            CODE_EVENT_INDEX_CLEARED => "The event in requested index is outdated and cleared",
            _ => "Store error",
        };
        Self {
            error_code,
            message: message.to_string(),
            cause: cause.into(),
            index,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.error_code {
            CODE_KEY_NOT_FOUND => ErrorKind::NotFound,
            101..=199 | 200..=299 => ErrorKind::Permanent,
            _ => ErrorKind::Transient,
        }
    }
}

/// Dogu descriptor (de)serialization failures
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Failed to parse dogu with {version} format: {source}")]
    Parse {
        version: FormatVersion,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write dogu {name} with {version} format: {source}")]
    Write {
        name: String,
        version: FormatVersion,
        #[source]
        source: serde_json::Error,
    },

    #[error("No dogu format provider configured")]
    NoProviders,
}

/// Whether `err`, or anything in its `source()` chain, denotes an absent key.
///
/// Errors produced by this crate answer through [`Error::kind`] directly; the
/// chain walk covers errors that were wrapped by foreign error types. The
/// payload of an [`std::io::Error`] is searched too, since its `source()`
/// skips it.
pub fn is_key_not_found(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |&e| e.source()).any(|link| {
        let payload = link
            .downcast_ref::<std::io::Error>()
            .and_then(|e| e.get_ref())
            .map(|inner| inner as &(dyn StdError + 'static));
        payload.is_some_and(is_key_not_found)
            || link.downcast_ref::<Error>().is_some_and(Error::is_not_found)
            || link
                .downcast_ref::<StoreError>()
                .is_some_and(|e| e.kind() == ErrorKind::NotFound)
            || link
                .downcast_ref::<ApiError>()
                .is_some_and(|e| e.kind() == ErrorKind::NotFound)
    })
}
