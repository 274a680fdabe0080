//! Client library for the cluster configuration registry of a dogu based
//! platform.
//!
//! All state lives in a hierarchical key-value coordination store:
//! - `/config/_global`, `/config/_host/<service>`, `/config/<dogu>`:
//!   configuration contexts ([`ConfigurationContext`])
//! - `/dogu` and `/dogu_v2`: dogu descriptors in the legacy and current
//!   formats, kept in sync by [`CombinedDoguRegistry`]
//! - `/state/<dogu>`: lifecycle markers ([`DoguState`])
//! - `/blueprint`: blueprint values
//!
//! Every store request goes through [`ResilientClient`], which retries
//! transient failures with the configured [`RetryPolicy`] and tells missing
//! keys apart from real errors. [`StoreRegistry`] wires everything onto one
//! connection.

pub mod constants;
pub mod utils;

mod config;
mod context;
mod dogu;
mod errors;
mod metrics;
mod node;
mod registry;
mod state;
mod store;

pub use config::*;
pub use context::*;
pub use dogu::*;
pub use errors::*;
pub use metrics::*;
pub use node::*;
pub use registry::*;
pub use state::*;
pub use store::*;
