use std::sync::Arc;

use super::*;
use crate::Dogu;
use crate::MemKeysApi;
use crate::RegistrySettings;
use crate::RetryPolicy;

fn registry() -> StoreRegistry {
    let settings = RegistrySettings {
        retry: RetryPolicy::constant(10, 1),
        ..RegistrySettings::default()
    };
    StoreRegistry::with_keys_api(Arc::new(MemKeysApi::new()), &settings)
}

#[tokio::test]
async fn contexts_write_below_their_namespace() {
    let registry = registry();
    let client = registry.client().clone();

    registry.global_config().set("fqdn", "ces.local").await.unwrap();
    registry.host_config("k8s").set("ip", "10.0.0.1").await.unwrap();
    registry.dogu_config("nginx").set("url", "u").await.unwrap();
    registry.blueprint_registry().set("current", "b1").await.unwrap();
    registry.state("nginx").set("installed").await.unwrap();

    assert_eq!(client.get("/config/_global/fqdn").await.unwrap(), "ces.local");
    assert_eq!(client.get("/config/_host/k8s/ip").await.unwrap(), "10.0.0.1");
    assert_eq!(client.get("/config/nginx/url").await.unwrap(), "u");
    assert_eq!(client.get("/blueprint/current").await.unwrap(), "b1");
    assert_eq!(client.get("/state/nginx").await.unwrap(), "installed");
}

#[tokio::test]
async fn dogu_registry_writes_both_roots() {
    let registry = registry();
    let client = registry.client().clone();
    let cas = Dogu::new("official/cas", "6.0.0");

    registry.dogu_registry().register(&cas).await.unwrap();
    registry.dogu_registry().enable(&cas).await.unwrap();

    assert_eq!(client.get("/dogu/cas/current").await.unwrap(), "6.0.0");
    assert_eq!(client.get("/dogu_v2/cas/current").await.unwrap(), "6.0.0");
    assert!(client.exists("/dogu/cas/6.0.0").await.unwrap());
    assert!(client.exists("/dogu_v2/cas/6.0.0").await.unwrap());
}

#[tokio::test]
async fn get_node_projects_the_whole_store() {
    let registry = registry();
    registry.global_config().set("fqdn", "ces.local").await.unwrap();
    registry.state("nginx").set("installed").await.unwrap();

    let tree = registry.get_node().await.unwrap();
    let fqdn = tree
        .root()
        .get_sub_node("config")
        .and_then(|n| n.get_sub_node("_global"))
        .and_then(|n| n.get_sub_node("fqdn"))
        .unwrap();

    assert_eq!(fqdn.full_key(), "config/_global/fqdn");
    assert_eq!(fqdn.value(), "ces.local");
    assert_eq!(
        tree.root().get_sub_node("state").and_then(|n| n.get_sub_node("nginx")).map(|n| n.value()),
        Some("installed")
    );
}

#[test]
fn connect_rejects_invalid_settings() {
    let mut settings = RegistrySettings::default();
    settings.store.endpoints.clear();
    assert!(StoreRegistry::connect(&settings).is_err());

    let mut settings = RegistrySettings::default();
    settings.retry.max_retry_count = -1;
    assert!(matches!(
        StoreRegistry::connect(&settings),
        Err(crate::Error::InvalidRetryPolicy(_))
    ));
}

#[test]
fn connect_with_default_settings() {
    assert!(StoreRegistry::connect(&RegistrySettings::default()).is_ok());
}
