use dogu_registry::Dogu;
use dogu_registry::Registry;

use crate::common::in_memory_registry;

/// Writes a dogu below a single root the way an older or newer client would.
async fn write_raw(
    registry: &dogu_registry::StoreRegistry,
    root: &str,
    name: &str,
    version: &str,
    body: &str,
) {
    let client = registry.client();
    client.set(&format!("{root}/{name}/{version}"), body).await.unwrap();
    client.set(&format!("{root}/{name}/current"), version).await.unwrap();
}

#[tokio::test]
async fn get_all_unions_both_roots() {
    let registry = in_memory_registry();
    write_raw(
        &registry,
        "/dogu",
        "ldap",
        "2.4.0",
        r#"{"Name":"official/ldap","Version":"2.4.0","Dependencies":["nginx"]}"#,
    )
    .await;
    write_raw(
        &registry,
        "/dogu_v2",
        "cas",
        "6.0.0",
        r#"{"Name":"official/cas","Version":"6.0.0"}"#,
    )
    .await;

    let mut names: Vec<String> = registry
        .dogu_registry()
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();

    assert_eq!(names, vec!["official/cas".to_string(), "official/ldap".to_string()]);
}

#[tokio::test]
async fn current_schema_wins_for_the_same_dogu() {
    let registry = in_memory_registry();
    write_raw(
        &registry,
        "/dogu",
        "cas",
        "5.0.0",
        r#"{"Name":"official/cas","Version":"5.0.0"}"#,
    )
    .await;
    write_raw(
        &registry,
        "/dogu_v2",
        "cas",
        "6.0.0",
        r#"{"Name":"official/cas","Version":"6.0.0"}"#,
    )
    .await;

    let all = registry.dogu_registry().get_all().await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].version, "6.0.0");
    assert_eq!(registry.dogu_registry().get("cas").await.unwrap().version, "6.0.0");
}

#[tokio::test]
async fn legacy_only_dogu_is_still_readable() {
    let registry = in_memory_registry();
    write_raw(
        &registry,
        "/dogu",
        "ldap",
        "2.4.0",
        r#"{"Name":"official/ldap","Version":"2.4.0","Dependencies":["nginx"]}"#,
    )
    .await;

    let ldap: Dogu = registry.dogu_registry().get("official/ldap").await.unwrap();

    assert_eq!(ldap.version, "2.4.0");
    assert_eq!(ldap.dependencies.len(), 1);
    assert_eq!(ldap.dependencies[0].name, "nginx");
    assert_eq!(ldap.dependencies[0].dependency_type, "dogu");
}

#[tokio::test]
async fn broken_body_is_skipped_in_listings() {
    let registry = in_memory_registry();
    write_raw(&registry, "/dogu_v2", "broken", "1.0.0", "{not json").await;
    write_raw(
        &registry,
        "/dogu_v2",
        "cas",
        "6.0.0",
        r#"{"Name":"official/cas","Version":"6.0.0"}"#,
    )
    .await;
    write_raw(
        &registry,
        "/dogu",
        "cas",
        "6.0.0",
        r#"{"Name":"official/cas","Version":"6.0.0"}"#,
    )
    .await;

    let all = registry.dogu_registry().get_all().await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "official/cas");
}
