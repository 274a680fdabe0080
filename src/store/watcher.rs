use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::warn;

use super::Action;
use super::KeysApi;
use super::Response;
use super::WaitOptions;
use crate::ErrorKind;
use crate::StoreError;
use crate::CODE_EVENT_INDEX_CLEARED;

/// One change observed on a watched key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub action: Action,
    /// Full path of the changed key
    pub key: String,
    /// New value; `None` for deletions, expiries and directories
    pub value: Option<String>,
    pub prev_value: Option<String>,
    /// Store index of the change
    pub index: u64,
    pub dir: bool,
}

impl From<Response> for WatchEvent {
    fn from(response: Response) -> Self {
        Self {
            action: response.action,
            key: response.node.key,
            value: response.node.value,
            prev_value: response.prev_node.and_then(|n| n.value),
            index: response.node.modified_index,
            dir: response.node.dir,
        }
    }
}

/// Subscription handle returned by a watch.
///
/// Events are delivered through a bounded channel. The background task waits
/// on the channel when it is full, so a slow reader throttles the subscription
/// instead of losing events. Dropping the watcher cancels it.
pub struct Watcher {
    receiver: mpsc::Receiver<WatchEvent>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Watcher {
    pub(crate) fn spawn(
        api: Arc<dyn KeysApi>,
        key: String,
        recursive: bool,
        parent: &CancellationToken,
        buffer_size: usize,
        retry_delay: Duration,
    ) -> Self {
        let token = parent.child_token();
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let handle = tokio::spawn(watch_loop(api, key, recursive, token.clone(), sender, retry_delay));

        Self {
            receiver,
            token,
            handle,
        }
    }

    /// Next event, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await
    }

    /// Stops the subscription. Events already buffered can still be received.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Stream for Watcher {
    type Item = WatchEvent;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn watch_loop(
    api: Arc<dyn KeysApi>,
    key: String,
    recursive: bool,
    token: CancellationToken,
    sender: mpsc::Sender<WatchEvent>,
    retry_delay: Duration,
) {
    debug!(%key, recursive, "watch started");
    let mut after_index = 0;

    loop {
        let opts = WaitOptions {
            recursive,
            after_index,
        };
        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = api.wait(&key, opts) => result,
        };

        match result {
            Ok(response) => {
                after_index = response.node.modified_index.max(after_index);
                let event = WatchEvent::from(response);
                tokio::select! {
                    _ = token.cancelled() => break,
                    sent = sender.send(event) => {
                        if sent.is_err() {
                            debug!(%key, "watch receiver dropped");
                            break;
                        }
                    }
                }
            }
            Err(StoreError::Api(e)) if e.error_code == CODE_EVENT_INDEX_CLEARED => {
                warn!(%key, after_index, resume_from = e.index, "watch history cleared, resuming from current index");
                after_index = e.index;
            }
            Err(e) if e.kind() == ErrorKind::Permanent => {
                error!(%key, error = %e, "watch failed permanently");
                break;
            }
            Err(e) => {
                warn!(%key, error = %e, ?retry_delay, "watch request failed, retrying");
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep(retry_delay) => {}
                }
            }
        }
    }

    debug!(%key, "watch stopped");
}
