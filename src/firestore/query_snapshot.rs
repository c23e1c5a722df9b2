//! Firestore QuerySnapshot

use super::document_snapshot::{DocumentSnapshot, RawDocPayload};
use super::timestamp::DateTag;
use crate::error::{FirebaseError, FirestoreError};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Query payload exactly as the bridge delivers it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQueryPayload {
    /// Matching documents, in store order
    #[serde(default)]
    pub docs: Vec<RawDocPayload>,
}

/// Query snapshot containing multiple documents
///
/// Documents are kept raw and decoded on every access; nothing is cached.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    raw: RawQueryPayload,
    tag: DateTag,
}

impl QuerySnapshot {
    /// Wrap a raw payload
    pub fn new(raw: RawQueryPayload, tag: DateTag) -> Self {
        Self { raw, tag }
    }

    /// Parse a bridge payload
    pub fn from_payload(payload: serde_json::Value, tag: DateTag) -> Result<Self, FirebaseError> {
        let raw: RawQueryPayload = serde_json::from_value(payload)?;
        Ok(Self::new(raw, tag))
    }

    /// Raw documents, not decoded
    pub fn docs(&self) -> &[RawDocPayload] {
        &self.raw.docs
    }

    /// Number of documents
    pub fn size(&self) -> usize {
        self.raw.docs.len()
    }

    /// Check if the query result is empty
    pub fn is_empty(&self) -> bool {
        self.raw.docs.is_empty()
    }

    /// Decode each document and pass it to `callback`
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(DocumentSnapshot),
    {
        for snapshot in self.iter() {
            callback(snapshot);
        }
    }

    /// Lazily decoding iterator over the documents
    pub fn iter(&self) -> impl Iterator<Item = DocumentSnapshot> + '_ {
        self.raw
            .docs
            .iter()
            .map(|doc| DocumentSnapshot::decode(doc.clone(), &self.tag))
    }

    /// Decode all documents at once
    pub fn documents(&self) -> Vec<DocumentSnapshot> {
        self.iter().collect()
    }

    /// Change sets are not carried over the bridge
    pub fn doc_changes(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("QuerySnapshot.docChanges").into())
    }

    /// Snapshot metadata is not carried over the bridge
    pub fn metadata(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("QuerySnapshot.metadata").into())
    }

    /// The originating query is not retained
    pub fn query(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("QuerySnapshot.query").into())
    }
}
