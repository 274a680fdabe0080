use serial_test::serial;
use temp_env::with_vars;

use super::*;
use crate::ErrorKind;

fn cleanup_all_registry_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DOGU_REGISTRY__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_settings_should_initialize_with_hardcoded_values() {
    let settings = RegistrySettings::default();

    assert_eq!(settings.store.endpoints, vec!["http://127.0.0.1:4001".to_string()]);
    assert_eq!(settings.store.request_timeout_ms, 3000);
    assert_eq!(settings.retry.interval, 200);
    assert_eq!(settings.retry.max_retry_count, 4);
    assert_eq!(settings.retry.backoff_type(), BackoffType::Exponential);
    assert_eq!(settings.watch.buffer_size, 64);
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_registry_env_vars();
    with_vars(
        vec![
            ("DOGU_REGISTRY__RETRY__INTERVAL", Some("50")),
            ("DOGU_REGISTRY__RETRY__TYPE", Some("constant")),
            ("DOGU_REGISTRY__WATCH__BUFFER_SIZE", Some("8")),
        ],
        || {
            let settings = RegistrySettings::new().unwrap();

            assert_eq!(settings.retry.interval, 50);
            assert_eq!(settings.retry.backoff_type(), BackoffType::Constant);
            assert_eq!(settings.watch.buffer_size, 8);
        },
    );
}

#[test]
#[serial]
fn new_should_split_endpoint_list_from_environment() {
    cleanup_all_registry_env_vars();
    with_vars(
        vec![(
            "DOGU_REGISTRY__STORE__ENDPOINTS",
            Some("http://etcd-0:4001,http://etcd-1:4001"),
        )],
        || {
            let settings = RegistrySettings::new().unwrap();

            assert_eq!(
                settings.store.endpoints,
                vec!["http://etcd-0:4001".to_string(), "http://etcd-1:4001".to_string()]
            );
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_registry_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("registry.toml");

    std::fs::write(
        &config_path,
        r#"
        [store]
        endpoints = ["http://etcd.ecosystem.local:4001"]
        request_timeout_ms = 500

        [retry]
        interval = 10
        max_retry_count = 2
        type = "constant"
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base = RegistrySettings::new().expect("success");
        let settings = base.with_override_config(config_path.to_str().unwrap()).unwrap();

        assert_eq!(
            settings.store.endpoints,
            vec!["http://etcd.ecosystem.local:4001".to_string()]
        );
        assert_eq!(settings.store.request_timeout_ms, 500);
        assert_eq!(settings.retry, RetryPolicy::constant(10, 2));
        // untouched sections keep their defaults
        assert_eq!(settings.watch.buffer_size, 64);
    });
}

#[test]
#[serial]
fn environment_should_win_over_config_path_file() {
    cleanup_all_registry_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("registry.toml");
    std::fs::write(&config_path, "[retry]\nmax_retry_count = 7\n").unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("DOGU_REGISTRY__RETRY__MAX_RETRY_COUNT", Some("1")),
        ],
        || {
            let settings = RegistrySettings::new().unwrap();
            assert_eq!(settings.retry.max_retry_count, 1);
        },
    );
}

#[test]
#[serial]
fn load_should_reject_negative_retry_count() {
    cleanup_all_registry_env_vars();
    with_vars(vec![("DOGU_REGISTRY__RETRY__MAX_RETRY_COUNT", Some("-1"))], || {
        let err = RegistrySettings::load(None).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidRetryPolicy(_)));
        assert_eq!(err.kind(), ErrorKind::Permanent);
    });
}

#[test]
fn validation_should_fail_without_endpoints() {
    let mut settings = RegistrySettings::default();
    settings.store.endpoints.clear();

    assert!(matches!(settings.validate(), Err(crate::Error::Config(_))));
}

#[test]
fn validation_should_fail_with_blank_endpoint() {
    let mut settings = RegistrySettings::default();
    settings.store.endpoints.push("  ".to_string());

    assert!(settings.validate().is_err());
}

#[test]
fn validation_should_fail_with_zero_timeout_or_buffer() {
    let mut settings = RegistrySettings::default();
    settings.store.request_timeout_ms = 0;
    assert!(settings.validate().is_err());

    let mut settings = RegistrySettings::default();
    settings.watch.buffer_size = 0;
    assert!(settings.validate().is_err());
}
