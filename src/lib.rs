//! Firestore bridge client
//!
//! Client-side data-mapping layer for a Firestore store that is reachable only
//! through an asynchronous native bridge. References and queries are plain
//! values; snapshots are decoded from primitive-only bridge payloads.
//!
//! # Example
//! ```no_run
//! # use std::sync::Arc;
//! # async fn example(bridge: Arc<dyn firestore_bridge::firestore::Bridge>) -> Result<(), firestore_bridge::FirebaseError> {
//! use firestore_bridge::firestore::{Direction, FilterOperator, Firestore, Queryable, Settings};
//!
//! let firestore = Firestore::new(bridge, Settings::default()).await;
//! let adults = firestore
//!     .collection("users")?
//!     .where_("age", FilterOperator::GreaterThanOrEqual, 21)
//!     .order_by("age", Direction::Ascending)
//!     .limit(10)
//!     .get()
//!     .await?;
//! adults.for_each(|doc| println!("{}", doc.id()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub mod firestore;

// Re-exports for convenience
pub use error::{BridgeError, FirebaseError, FirestoreError};

pub use firestore::{CollectionReference, DocumentReference, Firestore, Queryable};
