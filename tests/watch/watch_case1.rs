use std::time::Duration;

use dogu_registry::Action;
use dogu_registry::Registry;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::common::in_memory_registry;

#[tokio::test]
async fn watch_sees_dogu_activation() {
    let registry = in_memory_registry();
    let token = CancellationToken::new();
    let mut watcher = registry.root_config().watch("/dogu_v2", true, token.clone());
    tokio::task::yield_now().await;

    let dogu = dogu_registry::Dogu::new("official/cas", "6.0.0");
    registry.dogu_registry().register(&dogu).await.unwrap();
    registry.dogu_registry().enable(&dogu).await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), watcher.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.action, Action::Set);
    assert_eq!(first.key, "/dogu_v2/cas/6.0.0");

    let second = tokio::time::timeout(Duration::from_secs(1), watcher.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.key, "/dogu_v2/cas/current");
    assert_eq!(second.value.as_deref(), Some("6.0.0"));

    token.cancel();
    assert!(watcher.next().await.is_none());
}

#[tokio::test]
async fn dropping_the_watcher_stops_the_subscription() {
    let registry = in_memory_registry();
    let token = CancellationToken::new();
    let watcher = registry.root_config().watch("/config", true, token.clone());

    drop(watcher);

    assert!(!token.is_cancelled(), "only the child token is cancelled");
    registry.global_config().set("fqdn", "ces.local").await.unwrap();
}
