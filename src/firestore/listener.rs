//! Snapshot listeners and the registry that tracks them
//!
//! Every subscription is driven by its own tokio task that reads the bridge
//! stream in order and hands each decoded snapshot to the listener. The future
//! returned to the caller settles once, on the first delivered payload.
//!
//! There is no way to stop a subscription from this side. It lives until the
//! bridge ends the stream or the process exits.

use super::bridge::BridgeMethod;
use super::firestore::FirestoreInner;
use super::metadata_changes::MetadataChanges;
use crate::error::FirebaseError;
use futures::stream::StreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Process-unique listener identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Options forwarded to the native listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenOptions {
    /// Include metadata-only changes (like hasPendingWrites transitions)
    pub include_metadata_changes: bool,
}

impl From<MetadataChanges> for ListenOptions {
    fn from(changes: MetadataChanges) -> Self {
        Self {
            include_metadata_changes: changes.include(),
        }
    }
}

/// Snapshot callback tagged with its listener id
///
/// The id is fixed when the listener is created, so passing the same listener
/// to several `on_snapshot` calls correlates all of those subscriptions.
pub struct Listener<T> {
    id: ListenerId,
    callback: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Listener<T> {
    /// Wrap a callback and assign it a fresh id
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::generate(),
            callback: Arc::new(callback),
        }
    }

    /// A listener that drops every snapshot it receives
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Identifier assigned at creation
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback
    pub fn notify(&self, value: T) {
        (self.callback)(value)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// What the registry knows about one listener id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerEntry {
    /// Bridge method of the most recent subscription
    pub method: BridgeMethod,
    /// Target of the most recent subscription (`users` or `users/u1`)
    pub target: String,
    /// Number of subscriptions opened under this id
    pub subscriptions: usize,
}

/// Live subscriptions, keyed by listener id
///
/// Entries are never removed: this layer exposes no teardown.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: Mutex<HashMap<ListenerId, ListenerEntry>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ListenerId, ListenerEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a subscription for `id`
    pub fn register(&self, id: ListenerId, method: BridgeMethod, target: impl Into<String>) {
        let target = target.into();
        let mut entries = self.entries();
        let entry = entries.entry(id).or_insert_with(|| ListenerEntry {
            method,
            target: target.clone(),
            subscriptions: 0,
        });
        entry.method = method;
        entry.target = target;
        entry.subscriptions += 1;
        trace!(listener_id = %id, %method, subscriptions = entry.subscriptions, "listener registered");
    }

    /// Look up a listener id
    pub fn lookup(&self, id: ListenerId) -> Option<ListenerEntry> {
        self.entries().get(&id).cloned()
    }

    /// Number of distinct listener ids
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no listener was ever registered
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Open a bridge subscription and drive it from a background task
///
/// The subscription starts on the first poll of the returned future, which
/// then resolves with `listener` once the first payload has been delivered.
/// Delivery errors and undecodable payloads are logged and skipped. If the
/// bridge ends the stream before anything was delivered the future resolves
/// with [`FirebaseError::Cancelled`].
pub(crate) fn subscribe<T, D>(
    inner: Arc<FirestoreInner>,
    method: BridgeMethod,
    target: String,
    args: Vec<serde_json::Value>,
    listener: Listener<T>,
    decode: D,
) -> impl Future<Output = Result<Listener<T>, FirebaseError>> + Send
where
    T: Send + 'static,
    D: Fn(serde_json::Value) -> Result<T, FirebaseError> + Send + 'static,
{
    async move {
        inner.listeners.register(listener.id(), method, target.as_str());
        debug!(listener_id = %listener.id(), %method, target = %target, "opening snapshot stream");

        let mut stream = inner.bridge.subscribe(method, args);
        let (first_tx, first_rx) = oneshot::channel();
        let callback = listener.clone();

        tokio::spawn(async move {
            let mut first_tx = Some(first_tx);
            while let Some(item) = stream.next().await {
                let payload = match item {
                    Ok(payload) => payload,
                    Err(e) => {
                        debug!(listener_id = %callback.id(), %method, error = %e, "snapshot delivery failed");
                        continue;
                    }
                };
                match decode(payload) {
                    Ok(snapshot) => {
                        callback.notify(snapshot);
                        if let Some(tx) = first_tx.take() {
                            let _ = tx.send(());
                        }
                    }
                    Err(e) => {
                        warn!(listener_id = %callback.id(), %method, error = %e, "dropping undecodable snapshot");
                    }
                }
            }
            debug!(listener_id = %callback.id(), %method, target = %target, "snapshot stream ended");
        });

        first_rx.await.map_err(|_| FirebaseError::Cancelled)?;
        Ok(listener)
    }
}
