use std::collections::BTreeMap;
use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::trace;

use super::Action;
use super::DeleteOptions;
use super::GetOptions;
use super::KeysApi;
use super::PrevExist;
use super::Response;
use super::SetOptions;
use super::StoreNode;
use super::StoreResult;
use super::WaitOptions;
use crate::utils::path::normalize_key;
use crate::ApiError;
use crate::StoreError;
use crate::CODE_DIR_NOT_EMPTY;
use crate::CODE_EVENT_INDEX_CLEARED;
use crate::CODE_KEY_NOT_FOUND;
use crate::CODE_NODE_EXIST;
use crate::CODE_NOT_DIR;
use crate::CODE_NOT_FILE;
use crate::CODE_ROOT_READ_ONLY;

/// Number of change events kept for `wait` with an `after_index`
pub const HISTORY_CAPACITY: usize = 1000;

const ROOT: &str = "/";

/// In-process [`KeysApi`] with the same observable semantics as the store:
/// implicit parent directories, lifetimes, change history and long-poll waits.
///
/// Expired keys are removed lazily by the next access and reported to waiters
/// as `expire` events.
#[derive(Default)]
pub struct MemKeysApi {
    state: Mutex<State>,
    changed: Notify,
}

#[derive(Debug, Clone)]
struct Entry {
    dir: bool,
    value: String,
    expires_at: Option<Instant>,
    created_index: u64,
    modified_index: u64,
}

#[derive(Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    index: u64,
    history: VecDeque<Response>,
    /// Highest event index dropped from `history`
    evicted_up_to: u64,
}

impl MemKeysApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the latest change
    pub fn current_index(&self) -> u64 {
        self.lock().index
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        let mut state = self.state.lock();
        if state.purge_expired(Instant::now()) {
            self.changed.notify_waiters();
        }
        state
    }
}

#[async_trait]
impl KeysApi for MemKeysApi {
    async fn get(
        &self,
        key: &str,
        opts: GetOptions,
    ) -> StoreResult<Response> {
        let key = normalize_key(key);
        let now = Instant::now();
        let state = self.lock();

        let node = if key == ROOT {
            state.dir_node(ROOT, None, opts.recursive, now)
        } else {
            let entry = state.entries.get(&key).ok_or_else(|| not_found(&key, state.index))?;
            if entry.dir {
                state.dir_node(&key, Some(entry), opts.recursive, now)
            } else {
                entry_node(&key, entry, now)
            }
        };

        Ok(Response {
            action: Action::Get,
            node,
            prev_node: None,
            index: state.index,
        })
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: SetOptions,
    ) -> StoreResult<Response> {
        let key = normalize_key(key);
        let now = Instant::now();
        let mut state = self.lock();

        if key == ROOT {
            return Err(api_error(CODE_ROOT_READ_ONLY, ROOT, state.index));
        }

        let prev = state.entries.get(&key).cloned();
        match (opts.prev_exist, &prev) {
            (PrevExist::MustExist, None) => return Err(not_found(&key, state.index)),
            (PrevExist::MustNotExist, Some(_)) => return Err(api_error(CODE_NODE_EXIST, &key, state.index)),
            _ => {}
        }

        if opts.refresh {
            let Some(prev) = prev else {
                return Err(not_found(&key, state.index));
            };
            let index = state.index;
            let mut refreshed = prev.clone();
            refreshed.expires_at = opts.ttl.map(|ttl| now + ttl);
            let node = entry_node(&key, &refreshed, now);
            state.entries.insert(key.clone(), refreshed);
            trace!(%key, "lifetime refreshed");
            return Ok(Response {
                action: Action::Update,
                node,
                prev_node: Some(entry_node(&key, &prev, now)),
                index,
            });
        }

        if prev.as_ref().is_some_and(|p| p.dir) {
            return Err(api_error(CODE_NOT_FILE, &key, state.index));
        }

        let parents = ancestors(&key);
        if let Some(file) = parents
            .iter()
            .find(|p| state.entries.get(p.as_str()).is_some_and(|e| !e.dir))
        {
            return Err(api_error(CODE_NOT_DIR, file, state.index));
        }

        state.index += 1;
        let index = state.index;
        for parent in parents {
            state.entries.entry(parent).or_insert_with(|| Entry {
                dir: true,
                value: String::new(),
                expires_at: None,
                created_index: index,
                modified_index: index,
            });
        }

        let entry = Entry {
            dir: opts.dir,
            value: if opts.dir { String::new() } else { value.to_string() },
            expires_at: opts.ttl.map(|ttl| now + ttl),
            created_index: prev.as_ref().map_or(index, |p| p.created_index),
            modified_index: index,
        };
        let node = entry_node(&key, &entry, now);
        state.entries.insert(key.clone(), entry);

        let action = match opts.prev_exist {
            PrevExist::MustExist => Action::Update,
            PrevExist::MustNotExist => Action::Create,
            PrevExist::Ignore => Action::Set,
        };
        let response = Response {
            action,
            node,
            prev_node: prev.map(|p| entry_node(&key, &p, now)),
            index,
        };
        state.record(response.clone());
        drop(state);
        self.changed.notify_waiters();

        Ok(response)
    }

    async fn delete(
        &self,
        key: &str,
        opts: DeleteOptions,
    ) -> StoreResult<Response> {
        let key = normalize_key(key);
        let now = Instant::now();
        let mut state = self.lock();

        if key == ROOT {
            return Err(api_error(CODE_ROOT_READ_ONLY, ROOT, state.index));
        }

        let prev = state.entries.get(&key).cloned().ok_or_else(|| not_found(&key, state.index))?;
        if prev.dir {
            if !opts.dir && !opts.recursive {
                return Err(api_error(CODE_NOT_FILE, &key, state.index));
            }
            if !opts.recursive && !state.children(&key).is_empty() {
                return Err(api_error(CODE_DIR_NOT_EMPTY, &key, state.index));
            }
        }

        state.remove_subtree(&key);
        state.index += 1;
        let index = state.index;
        let response = Response {
            action: Action::Delete,
            node: StoreNode {
                key: key.clone(),
                dir: prev.dir,
                created_index: prev.created_index,
                modified_index: index,
                ..StoreNode::default()
            },
            prev_node: Some(entry_node(&key, &prev, now)),
            index,
        };
        state.record(response.clone());
        drop(state);
        self.changed.notify_waiters();

        Ok(response)
    }

    async fn wait(
        &self,
        key: &str,
        opts: WaitOptions,
    ) -> StoreResult<Response> {
        let key = normalize_key(key);
        let after_index = if opts.after_index == 0 {
            self.lock().index
        } else {
            opts.after_index
        };

        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_expiry = {
                let state = self.lock();
                if after_index < state.evicted_up_to {
                    return Err(api_error(
                        CODE_EVENT_INDEX_CLEARED,
                        &format!(
                            "the requested history has been cleared [{}/{}]",
                            state.evicted_up_to + 1,
                            after_index + 1
                        ),
                        state.index,
                    ));
                }

                if let Some(event) = state
                    .history
                    .iter()
                    .find(|e| e.index > after_index && watches(&key, &e.node.key, opts.recursive))
                {
                    return Ok(event.clone());
                }

                state.next_expiry()
            };

            match next_expiry {
                Some(at) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(at) => {}
                    }
                }
                None => notified.await,
            }
        }
    }
}

impl State {
    /// Removes every key whose lifetime ended, recording one `expire` event per
    /// key. Returns whether anything was removed.
    fn purge_expired(
        &mut self,
        now: Instant,
    ) -> bool {
        let mut purged = false;
        loop {
            let Some(key) = self.first_expired(now) else {
                break;
            };
            let Some(prev) = self.remove_subtree(&key) else {
                break;
            };
            self.index += 1;
            let index = self.index;
            trace!(%key, index, "key expired");
            self.record(Response {
                action: Action::Expire,
                node: StoreNode {
                    key: key.clone(),
                    dir: prev.dir,
                    created_index: prev.created_index,
                    modified_index: index,
                    ..StoreNode::default()
                },
                prev_node: Some(entry_node(&key, &prev, now)),
                index,
            });
            purged = true;
        }
        purged
    }

    fn first_expired(
        &self,
        now: Instant,
    ) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, e)| e.expires_at.is_some_and(|at| at <= now))
            .map(|(k, _)| k.clone())
    }

    fn record(
        &mut self,
        event: Response,
    ) {
        self.history.push_back(event);
        while self.history.len() > HISTORY_CAPACITY {
            if let Some(evicted) = self.history.pop_front() {
                self.evicted_up_to = evicted.index;
            }
        }
    }

    fn remove_subtree(
        &mut self,
        key: &str,
    ) -> Option<Entry> {
        let prefix = format!("{key}/");
        let descendants: Vec<String> = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for descendant in descendants {
            self.entries.remove(&descendant);
        }
        self.entries.remove(key)
    }

    /// Immediate children of a directory, ordered by key
    fn children(
        &self,
        dir_key: &str,
    ) -> Vec<(&String, &Entry)> {
        let prefix = if dir_key == ROOT {
            ROOT.to_string()
        } else {
            format!("{dir_key}/")
        };
        self.entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .collect()
    }

    fn dir_node(
        &self,
        key: &str,
        entry: Option<&Entry>,
        recursive: bool,
        now: Instant,
    ) -> StoreNode {
        let mut node = match entry {
            Some(entry) => entry_node(key, entry, now),
            None => StoreNode {
                dir: true,
                ..StoreNode::default()
            },
        };
        node.nodes = self
            .children(key)
            .into_iter()
            .map(|(child_key, child)| {
                if child.dir && recursive {
                    self.dir_node(child_key, Some(child), true, now)
                } else {
                    entry_node(child_key, child, now)
                }
            })
            .collect();
        node
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.entries.values().filter_map(|e| e.expires_at).min()
    }
}

fn entry_node(
    key: &str,
    entry: &Entry,
    now: Instant,
) -> StoreNode {
    StoreNode {
        key: key.to_string(),
        value: (!entry.dir).then(|| entry.value.clone()),
        dir: entry.dir,
        nodes: Vec::new(),
        ttl: entry.expires_at.map(|at| {
            let remaining = at.saturating_duration_since(now).as_millis();
            remaining.div_ceil(1000) as i64
        }),
        expiration: None,
        created_index: entry.created_index,
        modified_index: entry.modified_index,
    }
}

/// `/a/b/c` -> [`/a`, `/a/b`]
fn ancestors(key: &str) -> Vec<String> {
    let mut parents = Vec::new();
    let mut end = 0;
    while let Some(pos) = key[end + 1..].find('/') {
        end += pos + 1;
        parents.push(key[..end].to_string());
    }
    parents
}

fn watches(
    watched: &str,
    changed: &str,
    recursive: bool,
) -> bool {
    if changed == watched {
        return true;
    }
    recursive && (watched == ROOT || changed.starts_with(&format!("{watched}/")))
}

fn api_error(
    code: u32,
    cause: &str,
    index: u64,
) -> StoreError {
    StoreError::Api(ApiError::new(code, cause, index))
}

fn not_found(
    key: &str,
    index: u64,
) -> StoreError {
    api_error(CODE_KEY_NOT_FOUND, key, index)
}

