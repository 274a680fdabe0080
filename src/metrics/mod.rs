use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::Opts;

lazy_static! {
    pub static ref STORE_ATTEMPTS: IntCounterVec = IntCounterVec::new(
        Opts::new("registry_store_attempts_total", "Store requests sent, including retries"),
        &["operation"]
    )
    .expect("metric can not be created");

    pub static ref STORE_RETRIES: IntCounterVec = IntCounterVec::new(
        Opts::new("registry_store_retries_total", "Store requests repeated after a transient failure"),
        &["operation"]
    )
    .expect("metric can not be created");

    pub static ref STORE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("registry_store_failures_total", "Store operations that returned an error to the caller"),
        &["operation", "kind"]
    )
    .expect("metric can not be created");

    pub static ref METRICS_REGISTRY: prometheus::Registry = prometheus::Registry::new();
}

static REGISTER_METRICS: Once = Once::new();

/// Registers the store counters in [`METRICS_REGISTRY`]. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        METRICS_REGISTRY
            .register(Box::new(STORE_ATTEMPTS.clone()))
            .expect("collector can be registered");
        METRICS_REGISTRY
            .register(Box::new(STORE_RETRIES.clone()))
            .expect("collector can be registered");
        METRICS_REGISTRY
            .register(Box::new(STORE_FAILURES.clone()))
            .expect("collector can be registered");
    });
}

#[cfg(test)]
mod metrics_test;
