//! Cloud Firestore over a native bridge channel
//!
//! # Module Structure
//! - `bridge.rs` - the external channel (`Bridge`, `BridgeMethod`)
//! - `firestore.rs` - client root (`Firestore`)
//! - `collection_reference.rs` / `document_reference.rs` - reference model
//! - `query.rs` - `Queryable`, `Query`, and the wire descriptor
//! - `document_snapshot.rs` / `query_snapshot.rs` - snapshot decoding
//! - `field_value.rs` / `timestamp.rs` - typed values and the timestamp tag
//! - `listener.rs` - listeners and the listener registry
//! - `settings.rs` / `metadata_changes.rs` - configuration

pub mod bridge;
pub mod collection_reference;
pub mod document_reference;
pub mod document_snapshot;
pub mod field_value;
/// Metadata change tracking for real-time listeners
pub mod metadata_changes;
pub mod query;
pub mod query_snapshot;
pub mod settings;
pub mod timestamp;

/// Bridge-backed Firestore client
pub mod firestore;
pub mod listener;

// Re-export main Firestore client
pub use firestore::Firestore;

pub use bridge::{Bridge, BridgeMethod};

pub use field_value::{FieldValue, MapValue};

pub use query::{
    Cursor, Direction, FilterOperator, OrderBy, Query, QueryDescriptor, QueryOp, Queryable,
    WhereFilter,
};

pub use timestamp::{DateTag, Timestamp};

pub use settings::Settings;

pub use collection_reference::CollectionReference;

pub use document_reference::{DocumentListen, DocumentReference, SetOptions};

pub use document_snapshot::{DocumentSnapshot, RawDocPayload};

pub use query_snapshot::{QuerySnapshot, RawQueryPayload};

pub use metadata_changes::MetadataChanges;

pub use listener::{ListenOptions, Listener, ListenerEntry, ListenerId, ListenerRegistry};
