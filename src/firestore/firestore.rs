//! Bridge-backed Firestore client
//!
//! Owns the bridge handle, the settings, and the listener registry that all
//! references created from it share.

use super::bridge::{Bridge, BridgeMethod};
use super::collection_reference::CollectionReference;
use super::listener::ListenerRegistry;
use super::settings::Settings;
use super::timestamp::DateTag;
use crate::error::{FirebaseError, FirestoreError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Firestore database client
#[derive(Clone)]
pub struct Firestore {
    pub(crate) inner: Arc<FirestoreInner>,
}

/// State shared by a client and every reference, query and listener derived from it
#[doc(hidden)]
pub struct FirestoreInner {
    pub(crate) bridge: Arc<dyn Bridge>,
    pub(crate) settings: Settings,
    pub(crate) date_tag: DateTag,
    pub(crate) listeners: ListenerRegistry,
}

impl FirestoreInner {
    /// One-shot bridge call, mapping failures into [`FirestoreError::Bridge`]
    pub(crate) async fn call(
        &self,
        method: BridgeMethod,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, FirebaseError> {
        debug!(%method, args = args.len(), "bridge call");
        self.bridge.call(method, args).await.map_err(|e| {
            debug!(%method, error = %e, "bridge call failed");
            FirebaseError::from(FirestoreError::Bridge(e))
        })
    }
}

impl Firestore {
    /// Create a new client and initialise the native side
    ///
    /// Sends `initialise(persistenceEnabled)`. The native plugin does not
    /// report anything useful for this call, so a failure is logged and the
    /// client is returned regardless.
    ///
    /// # Example
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use firestore_bridge::firestore::{Bridge, Firestore, Settings};
    /// # async fn example(bridge: Arc<dyn Bridge>) {
    /// let firestore = Firestore::new(bridge, Settings::default().with_persistence(false)).await;
    /// # }
    /// ```
    pub async fn new(bridge: Arc<dyn Bridge>, settings: Settings) -> Self {
        let inner = FirestoreInner {
            bridge,
            settings,
            date_tag: DateTag,
            listeners: ListenerRegistry::new(),
        };

        let args = vec![serde_json::Value::Bool(inner.settings.persistence_enabled)];
        if let Err(e) = inner.call(BridgeMethod::Initialise, args).await {
            warn!(error = %e, "native initialise failed");
        }

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get a reference to a collection
    ///
    /// # Arguments
    /// * `path` - Collection path (e.g., "users" or "users/u1/posts")
    pub fn collection(&self, path: impl AsRef<str>) -> Result<CollectionReference, FirebaseError> {
        CollectionReference::new(path.as_ref(), Arc::clone(&self.inner))
    }

    /// Settings this client was created with
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Registry of every listener opened through this client
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.inner.listeners
    }
}

impl fmt::Debug for Firestore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Firestore")
            .field("settings", &self.inner.settings)
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}
