use dogu_registry::Dependency;
use dogu_registry::Dogu;
use dogu_registry::ErrorKind;
use dogu_registry::Registry;

use crate::common::in_memory_registry;

fn nginx(version: &str) -> Dogu {
    let mut dogu = Dogu::new("official/nginx", version);
    dogu.display_name = "Nginx".to_string();
    dogu.dependencies = vec![Dependency::dogu("registrator", ">=0.1.0")];
    dogu
}

#[tokio::test]
async fn register_enable_get_round_trip() {
    let registry = in_memory_registry();
    let dogus = registry.dogu_registry();
    let dogu = nginx("1.23.1-1");

    dogus.register(&dogu).await.unwrap();
    assert!(!dogus.is_enabled("nginx").await.unwrap());

    dogus.enable(&dogu).await.unwrap();

    assert!(dogus.is_enabled("official/nginx").await.unwrap());
    let stored = dogus.get("nginx").await.unwrap();
    assert_eq!(stored.name, "official/nginx");
    assert_eq!(stored.version, "1.23.1-1");
    assert_eq!(stored.display_name, "Nginx");
    assert_eq!(stored.dependencies, vec![Dependency::dogu("registrator", ">=0.1.0")]);
}

#[tokio::test]
async fn legacy_root_keeps_dependency_names_only() {
    let registry = in_memory_registry();
    let dogu = nginx("1.23.1-1");

    registry.dogu_registry().register(&dogu).await.unwrap();

    let legacy = registry.client().get("/dogu/nginx/1.23.1-1").await.unwrap();
    assert!(legacy.contains(r#""Dependencies":["registrator"]"#), "{legacy}");
    let current = registry.client().get("/dogu_v2/nginx/1.23.1-1").await.unwrap();
    assert!(current.contains(r#""name":"registrator""#), "{current}");
}

#[tokio::test]
async fn unregister_keeps_version_bodies() {
    let registry = in_memory_registry();
    let dogus = registry.dogu_registry();
    let dogu = nginx("1.23.1-1");
    dogus.register(&dogu).await.unwrap();
    dogus.enable(&dogu).await.unwrap();

    dogus.unregister("nginx").await.unwrap();

    assert!(!dogus.is_enabled("nginx").await.unwrap());
    let err = dogus.get("nginx").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(registry.client().exists("/dogu_v2/nginx/1.23.1-1").await.unwrap());
    assert!(registry.client().exists("/dogu/nginx/1.23.1-1").await.unwrap());
}

#[tokio::test]
async fn upgrade_switches_the_active_version() {
    let registry = in_memory_registry();
    let dogus = registry.dogu_registry();
    for version in ["1.0.0", "2.0.0"] {
        let dogu = nginx(version);
        dogus.register(&dogu).await.unwrap();
        dogus.enable(&dogu).await.unwrap();
    }

    assert_eq!(dogus.get("nginx").await.unwrap().version, "2.0.0");
    assert_eq!(dogus.get_all().await.unwrap().len(), 1);
}
