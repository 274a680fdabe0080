use dogu_registry::ErrorKind;
use dogu_registry::Registry;

use crate::common::in_memory_registry;

#[tokio::test]
async fn get_or_false_tells_absent_from_empty() {
    let registry = in_memory_registry();
    let config = registry.dogu_config("nginx");
    config.set("empty", "").await.unwrap();
    config.set("url", "https://ces.local").await.unwrap();

    assert_eq!(config.get_or_false("missing").await.unwrap(), (false, String::new()));
    assert_eq!(config.get_or_false("empty").await.unwrap(), (true, String::new()));
    assert_eq!(
        config.get_or_false("url").await.unwrap(),
        (true, "https://ces.local".to_string())
    );
}

#[tokio::test]
async fn missing_key_reads_as_not_found() {
    let registry = in_memory_registry();
    let global = registry.global_config();

    let err = global.get("fqdn").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!global.exists("fqdn").await.unwrap());
}

#[tokio::test]
async fn get_all_lists_nested_keys_relative_to_the_context() {
    let registry = in_memory_registry();
    let config = registry.dogu_config("postfix");
    config.set("relayhost", "mail.local").await.unwrap();
    config.set("sasl/user", "ces").await.unwrap();

    let all = config.get_all().await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all.get("relayhost").map(String::as_str), Some("mail.local"));
    assert_eq!(all.get("sasl/user").map(String::as_str), Some("ces"));
}

#[tokio::test]
async fn remove_all_clears_only_its_own_namespace() {
    let registry = in_memory_registry();
    registry.dogu_config("nginx").set("url", "u").await.unwrap();
    registry.dogu_config("cas").set("url", "c").await.unwrap();

    registry.dogu_config("nginx").remove_all().await.unwrap();

    assert!(!registry.client().exists("/config/nginx").await.unwrap());
    assert_eq!(registry.dogu_config("cas").get("url").await.unwrap(), "c");
}

#[tokio::test]
async fn state_marker_follows_the_lifecycle() {
    let registry = in_memory_registry();
    let state = registry.state("redmine");

    assert_eq!(state.get().await.unwrap(), "");
    state.set("installing").await.unwrap();
    assert_eq!(state.get().await.unwrap(), "installing");
    state.remove().await.unwrap();
    assert_eq!(state.get().await.unwrap(), "");
    state.remove().await.unwrap();
}

#[tokio::test]
async fn tree_snapshot_reflects_all_namespaces() {
    let registry = in_memory_registry();
    registry.global_config().set("fqdn", "ces.local").await.unwrap();
    registry.blueprint_registry().set("current", "bp-1").await.unwrap();

    let tree = registry.get_node().await.unwrap();
    let root = tree.root();
    let mut top: Vec<&str> = root.sub_nodes().map(|n| n.key()).collect();
    top.sort();

    assert_eq!(top, vec!["blueprint", "config"]);
    assert_eq!(
        root.get_sub_node("blueprint")
            .and_then(|n| n.get_sub_node("current"))
            .map(|n| n.value()),
        Some("bp-1")
    );
}
