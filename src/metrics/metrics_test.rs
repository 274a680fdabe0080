use super::*;

#[test]
fn register_metrics_should_be_idempotent() {
    register_metrics();
    register_metrics();

    STORE_ATTEMPTS.with_label_values(&["metrics_test"]).inc();

    let families = METRICS_REGISTRY.gather();
    let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
    assert!(names.contains(&"registry_store_attempts_total"));
}

#[test]
fn failure_counter_should_be_labeled_by_kind() {
    STORE_FAILURES.with_label_values(&["metrics_test_get", "not_found"]).inc();

    assert_eq!(
        STORE_FAILURES
            .with_label_values(&["metrics_test_get", "not_found"])
            .get(),
        1
    );
}
