use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::Action;
use crate::MemKeysApi;
use crate::ResilientClient;
use crate::RetryPolicy;
use crate::WatchConfig;

fn watch_context() -> (StoreWatchContext, ResilientClient) {
    let client = ResilientClient::new(
        Arc::new(MemKeysApi::new()),
        RetryPolicy::constant(10, 1),
        Duration::from_secs(1),
        WatchConfig::default(),
    );
    (StoreWatchContext::new(client.clone()), client)
}

#[tokio::test]
async fn watch_reports_changes_of_a_subtree() {
    let (ctx, client) = watch_context();
    let token = CancellationToken::new();
    let mut watcher = ctx.watch("/config/_global", true, token.clone());
    tokio::task::yield_now().await;

    client.set("/config/_global/maintenance", "on").await.unwrap();

    let event = watcher.recv().await.unwrap();
    assert_eq!(event.action, Action::Set);
    assert_eq!(event.key, "/config/_global/maintenance");

    token.cancel();
    assert_eq!(watcher.recv().await, None);
}

#[tokio::test]
async fn reads_are_unscoped() {
    let (ctx, client) = watch_context();
    client.set("/dogu/cas/current", "1.0").await.unwrap();
    client.set("/dogu/nginx/current", "2.0").await.unwrap();

    assert_eq!(ctx.get("/dogu/cas/current").await.unwrap(), "1.0");
    assert_eq!(
        ctx.get_children_paths("/dogu").await.unwrap(),
        vec!["/dogu/cas".to_string(), "/dogu/nginx".to_string()]
    );
    assert!(ctx.get_children_paths("/nothing").await.unwrap().is_empty());
}
