//! Error types
//!
//! Provides a unified error type hierarchy for all bridge-backed Firestore
//! operations.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.
//!
//! Two failure classes exist:
//! - failures reported by the bridge for a one-shot call ([`BridgeError`]),
//! - capabilities this layer never offers ([`FirestoreError::UnsupportedOperation`]),
//!   returned synchronously from the accessor that was called.

use thiserror::Error;

/// Top-level error type
///
/// Wraps Firestore errors and serialization failures into a unified type.
///
/// # Example
/// ```
/// use firestore_bridge::{FirebaseError, FirestoreError};
///
/// let err: FirebaseError = FirestoreError::unsupported("QuerySnapshot.metadata").into();
/// assert!(err.is_unsupported());
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation cancelled (e.g. a snapshot stream closed before its first payload)
    #[error("Operation cancelled")]
    Cancelled,
}

/// Firestore errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Failure reported by the bridge for a one-shot call
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Capability outside this layer's contract
    #[error("{operation}: Not supported")]
    UnsupportedOperation {
        /// Qualified name of the rejected operation, e.g. `CollectionReference.parent`
        operation: &'static str,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload did not have the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Error reported by a [`Bridge`](crate::firestore::Bridge) implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeError {
    /// Store error code, when the native side supplies one (e.g. `permission-denied`)
    pub code: Option<String>,
    /// Human readable message
    pub message: String,
}

impl BridgeError {
    /// Create a bridge error without a code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create a bridge error with a store error code
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BridgeError {}

impl FirestoreError {
    /// Create an unsupported-operation error
    pub fn unsupported(operation: &'static str) -> Self {
        Self::UnsupportedOperation { operation }
    }
}

impl FirebaseError {
    /// Check if the error is a permanent contract gap
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::Firestore(FirestoreError::UnsupportedOperation { .. })
        )
    }

    /// Check if the store reported a transient condition
    ///
    /// This layer never retries; the flag is informational for callers.
    pub fn is_retryable(&self) -> bool {
        let Self::Firestore(FirestoreError::Bridge(bridge)) = self else {
            return false;
        };
        matches!(
            bridge.code.as_deref(),
            Some("unavailable" | "deadline-exceeded" | "resource-exhausted" | "aborted")
        )
    }
}
