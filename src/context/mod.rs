//! Namespaced views on the store.
//!
//! A [`ConfigurationContext`] scopes every key below one parent path such as
//! `/config/_global` or `/config/nginx`. A [`WatchConfigurationContext`] is
//! unscoped and combines change subscriptions with key enumeration.

mod configuration;
mod watch;

pub use configuration::*;
pub use watch::*;

#[cfg(test)]
mod watch_test;
