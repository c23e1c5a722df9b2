//! Firestore CollectionReference type

use super::bridge::BridgeMethod;
use super::document_reference::DocumentReference;
use super::field_value::{FieldValue, MapValue};
use super::firestore::FirestoreInner;
use super::query::{QueryDescriptor, Queryable};
use crate::error::{FirebaseError, FirestoreError};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Reference to a Firestore collection
///
/// Implements [`Queryable`], so filters, ordering and cursors can be chained
/// directly on it. A collection carries a path and no id.
#[derive(Clone)]
pub struct CollectionReference {
    descriptor: QueryDescriptor,
    pub(crate) firestore: Arc<FirestoreInner>,
}

impl CollectionReference {
    /// Create a new collection reference
    ///
    /// Leading and trailing slashes are ignored; an empty path or an empty
    /// segment is rejected.
    pub(crate) fn new(path: &str, firestore: Arc<FirestoreInner>) -> Result<Self, FirebaseError> {
        let path = path.trim_matches('/');
        if path.is_empty() || path.split('/').any(str::is_empty) {
            return Err(FirestoreError::InvalidArgument(format!(
                "collection path {:?} must not contain empty segments",
                path
            ))
            .into());
        }

        Ok(Self {
            descriptor: QueryDescriptor::new(path),
            firestore,
        })
    }

    /// Slash-delimited collection path
    pub fn path(&self) -> &str {
        &self.descriptor.path
    }

    /// Collections have no id of their own
    pub fn id(&self) -> Option<&str> {
        None
    }

    /// Get a document reference within this collection
    pub fn doc(&self, id: impl Into<String>) -> Result<DocumentReference, FirebaseError> {
        DocumentReference::new(self.clone(), id.into())
    }

    /// Add a new document with a store-generated id
    ///
    /// Returns the native side's acknowledgement unchanged.
    pub async fn add(&self, data: MapValue) -> Result<serde_json::Value, FirebaseError> {
        let args = vec![
            serde_json::Value::String(self.path().to_string()),
            FieldValue::Map(data).to_wire(),
        ];
        debug!(path = self.path(), "adding document");
        self.firestore.call(BridgeMethod::CollectionAdd, args).await
    }

    /// Collections have no parent reference in this layer
    pub fn parent(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("CollectionReference.parent").into())
    }

    /// The owning client is not reachable from a reference
    pub fn firestore(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("CollectionReference.firestore").into())
    }
}

impl Queryable for CollectionReference {
    fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    fn firestore_inner(&self) -> &Arc<FirestoreInner> {
        &self.firestore
    }
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl Eq for CollectionReference {}

impl Hash for CollectionReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path().hash(state);
    }
}

impl fmt::Debug for CollectionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionReference")
            .field("path", &self.path())
            .finish()
    }
}
