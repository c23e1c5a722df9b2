//! Firestore DocumentReference type

use super::bridge::BridgeMethod;
use super::collection_reference::CollectionReference;
use super::document_snapshot::DocumentSnapshot;
use super::field_value::{FieldValue, MapValue};
use super::listener::{self, ListenOptions, Listener};
use crate::error::{FirebaseError, FirestoreError};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Options for [`DocumentReference::set`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetOptions {
    /// Merge into the existing document instead of replacing it
    pub merge: bool,
}

impl SetOptions {
    /// Merge into the existing document
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// How a document listener was requested
///
/// `Callback` opens `docOnShapshot(path, id)`. `Options` also sends the
/// options object, and without a listener the decoded snapshots are dropped.
#[derive(Debug, Clone)]
pub enum DocumentListen {
    /// Callback only
    Callback(Listener<DocumentSnapshot>),
    /// Options, with or without a callback
    Options(ListenOptions, Option<Listener<DocumentSnapshot>>),
}

impl From<Listener<DocumentSnapshot>> for DocumentListen {
    fn from(listener: Listener<DocumentSnapshot>) -> Self {
        DocumentListen::Callback(listener)
    }
}

/// Reference to a Firestore document
///
/// Identified by its parent collection's path plus its id.
#[derive(Clone)]
pub struct DocumentReference {
    parent: CollectionReference,
    id: String,
}

impl DocumentReference {
    /// Create a new document reference
    pub(crate) fn new(parent: CollectionReference, id: String) -> Result<Self, FirebaseError> {
        if id.is_empty() || id.contains('/') {
            return Err(FirestoreError::InvalidArgument(format!(
                "document id {:?} must be a single non-empty path segment",
                id
            ))
            .into());
        }
        Ok(Self { parent, id })
    }

    /// Get the document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of the parent collection
    pub fn path(&self) -> &str {
        self.parent.path()
    }

    /// The collection this reference was created from
    pub fn parent(&self) -> &CollectionReference {
        &self.parent
    }

    fn key_args(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::Value::String(self.path().to_string()),
            serde_json::Value::String(self.id.clone()),
        ]
    }

    /// Get the document snapshot through `docGet`
    pub async fn get(&self) -> Result<DocumentSnapshot, FirebaseError> {
        debug!(path = self.path(), id = %self.id, "getting document");
        let payload = self
            .parent
            .firestore
            .call(BridgeMethod::DocGet, self.key_args())
            .await?;
        DocumentSnapshot::from_payload(payload, &self.parent.firestore.date_tag)
    }

    /// Set document data through `docSet`
    pub async fn set(&self, data: MapValue, options: Option<SetOptions>) -> Result<(), FirebaseError> {
        let mut args = self.key_args();
        args.push(FieldValue::Map(data).to_wire());
        args.push(serde_json::to_value(options)?);
        self.parent.firestore.call(BridgeMethod::DocSet, args).await?;
        Ok(())
    }

    /// Update document fields through `docUpdate`
    pub async fn update(&self, data: MapValue) -> Result<(), FirebaseError> {
        let mut args = self.key_args();
        args.push(FieldValue::Map(data).to_wire());
        self.parent.firestore.call(BridgeMethod::DocUpdate, args).await?;
        Ok(())
    }

    /// Listen to real-time updates through `docOnShapshot`
    ///
    /// Resolves with the listener that receives the snapshots once the first
    /// payload has been delivered. For [`DocumentListen::Options`] without a
    /// callback this is a no-op listener.
    pub fn on_snapshot(
        &self,
        listen: impl Into<DocumentListen>,
    ) -> impl Future<Output = Result<Listener<DocumentSnapshot>, FirebaseError>> + Send {
        let inner = Arc::clone(&self.parent.firestore);
        let target = format!("{}/{}", self.path(), self.id);
        let mut args = self.key_args();
        let listen = listen.into();

        async move {
            let listener = match listen {
                DocumentListen::Callback(listener) => listener,
                DocumentListen::Options(options, listener) => {
                    args.push(serde_json::to_value(options)?);
                    listener.unwrap_or_else(Listener::noop)
                }
            };
            let tag = inner.date_tag;
            listener::subscribe(
                Arc::clone(&inner),
                BridgeMethod::DocOnSnapshot,
                target,
                args,
                listener,
                move |payload| DocumentSnapshot::from_payload(payload, &tag),
            )
            .await
        }
    }

    /// Subcollections are not reachable through the bridge
    pub fn collection(&self, _collection_path: &str) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("DocumentReference.collection").into())
    }

    /// Deletes are not offered by the bridge
    pub fn delete(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("DocumentReference.delete").into())
    }

    /// The owning client is not reachable from a reference
    pub fn firestore(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("DocumentReference.firestore").into())
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path() && self.id == other.id
    }
}

impl Eq for DocumentReference {}

impl Hash for DocumentReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path().hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentReference")
            .field("path", &self.path())
            .field("id", &self.id)
            .finish()
    }
}
