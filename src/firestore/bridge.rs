//! Bridge channel to the native Firestore plugin
//!
//! The bridge is an external collaborator: this crate only names the methods
//! it calls and the positional arguments it sends. Implementations forward
//! calls to whatever transport the host platform provides.

use crate::error::BridgeError;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::fmt;

/// Methods exposed by the native side
///
/// The `*OnShapshot` spellings are the names registered by the native plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeMethod {
    /// `initialise(persistenceEnabled)`
    Initialise,
    /// `collectionGet(path, ops)`
    CollectionGet,
    /// `collectionOnShapshot(path, ops, options)`
    CollectionOnSnapshot,
    /// `collectionAdd(path, data)`
    CollectionAdd,
    /// `docGet(path, id)`
    DocGet,
    /// `docOnShapshot(path, id, options?)`
    DocOnSnapshot,
    /// `docSet(path, id, data, options)`
    DocSet,
    /// `docUpdate(path, id, data)`
    DocUpdate,
}

impl BridgeMethod {
    /// Method name as registered by the native plugin
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeMethod::Initialise => "initialise",
            BridgeMethod::CollectionGet => "collectionGet",
            BridgeMethod::CollectionOnSnapshot => "collectionOnShapshot",
            BridgeMethod::CollectionAdd => "collectionAdd",
            BridgeMethod::DocGet => "docGet",
            BridgeMethod::DocOnSnapshot => "docOnShapshot",
            BridgeMethod::DocSet => "docSet",
            BridgeMethod::DocUpdate => "docUpdate",
        }
    }
}

impl fmt::Display for BridgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asynchronous request/response and request/stream channel
///
/// Payloads are primitive-only JSON. Implementations must deliver the items
/// of one subscription in the order the native side emits them.
pub trait Bridge: Send + Sync + 'static {
    /// One-shot call; resolves exactly once
    fn call(
        &self,
        method: BridgeMethod,
        args: Vec<serde_json::Value>,
    ) -> BoxFuture<'static, Result<serde_json::Value, BridgeError>>;

    /// Streaming call; yields an unbounded number of payloads
    ///
    /// An `Err` item reports a delivery failure; it does not end the stream.
    fn subscribe(
        &self,
        method: BridgeMethod,
        args: Vec<serde_json::Value>,
    ) -> BoxStream<'static, Result<serde_json::Value, BridgeError>>;
}
