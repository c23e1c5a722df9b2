//! Firestore Queryable trait and query descriptors
//!
//! Queries are immutable: each builder method returns a new [`Query`] whose
//! descriptor is the previous operation list plus one appended operation.
//! Two chains branched from the same reference never observe each other's
//! operations.
//!
//! The descriptor is what travels over the bridge: a collection path and an
//! ordered list of `{"queryType", "value"}` objects. Operations are sent in
//! call order; cursors are neither reordered nor validated against a prior
//! `orderBy`, the store does that.

use super::bridge::BridgeMethod;
use super::document_snapshot::DocumentSnapshot;
use super::field_value::FieldValue;
use super::firestore::FirestoreInner;
use super::listener::{self, ListenOptions, Listener};
use super::query_snapshot::QuerySnapshot;
use crate::error::{FirebaseError, FirestoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Sort direction for query ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Smallest first (the default)
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Comparison operator of a `where` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `<=`
    #[serde(rename = "<=")]
    LessThanOrEqual,
    /// `==`
    #[serde(rename = "==")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `array-contains`
    #[serde(rename = "array-contains")]
    ArrayContains,
    /// `array-contains-any`
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
    /// `in`
    #[serde(rename = "in")]
    In,
    /// `not-in`
    #[serde(rename = "not-in")]
    NotIn,
}

impl FilterOperator {
    /// Operator string understood by the native side
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::ArrayContains => "array-contains",
            FilterOperator::ArrayContainsAny => "array-contains-any",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = FirestoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessThanOrEqual,
            "==" => FilterOperator::Equal,
            "!=" => FilterOperator::NotEqual,
            ">=" => FilterOperator::GreaterThanOrEqual,
            ">" => FilterOperator::GreaterThan,
            "array-contains" => FilterOperator::ArrayContains,
            "array-contains-any" => FilterOperator::ArrayContainsAny,
            "in" => FilterOperator::In,
            "not-in" => FilterOperator::NotIn,
            other => {
                return Err(FirestoreError::InvalidArgument(format!(
                    "unknown filter operator {:?}",
                    other
                )))
            }
        })
    }
}

/// Payload of a `where` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereFilter {
    /// Dotted field path
    pub field_path: String,
    /// Comparison operator
    pub op_str: FilterOperator,
    /// Comparison value in wire form (timestamps already tagged)
    pub value: serde_json::Value,
}

/// Payload of an `orderBy` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Dotted field path
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

/// Bound of a cursor operation
///
/// Either an opaque value derived from a snapshot, or the field values to
/// match against the query's ordering. Sent verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cursor {
    /// Field values, one per `orderBy` clause
    Values(Vec<serde_json::Value>),
    /// Snapshot-derived opaque value
    Snapshot(serde_json::Value),
}

impl Cursor {
    /// Cursor from field values
    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        Cursor::Values(values.into_iter().map(|v| v.into().to_wire()).collect())
    }

    /// Cursor positioned at a document snapshot
    pub fn snapshot(snapshot: &DocumentSnapshot) -> Result<Self, FirebaseError> {
        Ok(Cursor::Snapshot(serde_json::to_value(snapshot.raw())?))
    }
}

impl From<Vec<FieldValue>> for Cursor {
    fn from(values: Vec<FieldValue>) -> Self {
        Cursor::values(values)
    }
}

/// One step of a query chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "queryType", content = "value", rename_all = "camelCase")]
pub enum QueryOp {
    /// Field filter
    Where(WhereFilter),
    /// Ordering clause
    OrderBy(OrderBy),
    /// Maximum number of results
    Limit(i64),
    /// Inclusive lower bound
    StartAt(Cursor),
    /// Exclusive lower bound
    StartAfter(Cursor),
    /// Inclusive upper bound
    EndAt(Cursor),
    /// Exclusive upper bound
    EndBefore(Cursor),
}

impl QueryOp {
    /// Wire name of the operation kind
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOp::Where(_) => "where",
            QueryOp::OrderBy(_) => "orderBy",
            QueryOp::Limit(_) => "limit",
            QueryOp::StartAt(_) => "startAt",
            QueryOp::StartAfter(_) => "startAfter",
            QueryOp::EndAt(_) => "endAt",
            QueryOp::EndBefore(_) => "endBefore",
        }
    }
}

/// Collection path plus ordered operation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Collection path
    pub path: String,
    /// Operations in call order
    pub ops: Vec<QueryOp>,
}

impl QueryDescriptor {
    /// Descriptor with no operations
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ops: Vec::new(),
        }
    }

    /// Copy of this descriptor with `op` appended
    pub fn appended(&self, op: QueryOp) -> Self {
        let mut ops = Vec::with_capacity(self.ops.len() + 1);
        ops.extend_from_slice(&self.ops);
        ops.push(op);
        Self {
            path: self.path.clone(),
            ops,
        }
    }

    /// Positional bridge arguments `(path, ops)`
    pub fn to_args(&self) -> Result<Vec<serde_json::Value>, FirebaseError> {
        Ok(vec![
            serde_json::Value::String(self.path.clone()),
            serde_json::to_value(&self.ops)?,
        ])
    }
}

/// Capability shared by collection references and queries
///
/// Builder methods never mutate `self`; they return a new [`Query`] bound to
/// the same collection path.
pub trait Queryable {
    /// Current descriptor
    fn descriptor(&self) -> &QueryDescriptor;

    /// Client the query is bound to (internal use only, not part of public API)
    #[doc(hidden)]
    fn firestore_inner(&self) -> &Arc<FirestoreInner>;

    /// New query with `op` appended
    fn push_op(&self, op: QueryOp) -> Query {
        Query {
            descriptor: self.descriptor().appended(op),
            firestore: Arc::clone(self.firestore_inner()),
        }
    }

    /// Filter documents on a field
    ///
    /// A timestamp `value` is sent as a tagged string; anything else is sent
    /// unchanged.
    fn where_(
        &self,
        field_path: impl Into<String>,
        op: FilterOperator,
        value: impl Into<FieldValue>,
    ) -> Query {
        let value = value.into().to_filter_wire(&self.firestore_inner().date_tag);
        self.push_op(QueryOp::Where(WhereFilter {
            field_path: field_path.into(),
            op_str: op,
            value,
        }))
    }

    /// Order query results by field
    fn order_by(&self, field: impl Into<String>, direction: Direction) -> Query {
        self.push_op(QueryOp::OrderBy(OrderBy {
            field: field.into(),
            direction,
        }))
    }

    /// Order query results by field, ascending
    fn order_by_field(&self, field: impl Into<String>) -> Query {
        self.order_by(field, Direction::default())
    }

    /// Limit query results to first n documents
    fn limit(&self, limit: i64) -> Query {
        self.push_op(QueryOp::Limit(limit))
    }

    /// Start results at the cursor, inclusive
    fn start_at(&self, cursor: impl Into<Cursor>) -> Query {
        self.push_op(QueryOp::StartAt(cursor.into()))
    }

    /// Start results after the cursor
    fn start_after(&self, cursor: impl Into<Cursor>) -> Query {
        self.push_op(QueryOp::StartAfter(cursor.into()))
    }

    /// End results at the cursor, inclusive
    fn end_at(&self, cursor: impl Into<Cursor>) -> Query {
        self.push_op(QueryOp::EndAt(cursor.into()))
    }

    /// End results before the cursor
    fn end_before(&self, cursor: impl Into<Cursor>) -> Query {
        self.push_op(QueryOp::EndBefore(cursor.into()))
    }

    /// Execute the query once through `collectionGet`
    fn get(&self) -> impl Future<Output = Result<QuerySnapshot, FirebaseError>> + Send {
        let descriptor = self.descriptor().clone();
        let inner = Arc::clone(self.firestore_inner());
        async move {
            let args = descriptor.to_args()?;
            debug!(path = %descriptor.path, ops = descriptor.ops.len(), "running query");
            let payload = inner.call(BridgeMethod::CollectionGet, args).await?;
            QuerySnapshot::from_payload(payload, inner.date_tag)
        }
    }

    /// Listen to real-time updates through `collectionOnShapshot`
    ///
    /// `listener` is called with a freshly decoded [`QuerySnapshot`] for every
    /// payload, in delivery order. The returned future resolves with the
    /// listener once the first payload has been delivered. The subscription
    /// cannot be cancelled from this side.
    ///
    /// # Example
    /// ```no_run
    /// # use firestore_bridge::firestore::{Firestore, Listener, Queryable};
    /// # async fn example(firestore: Firestore) -> Result<(), firestore_bridge::FirebaseError> {
    /// let listener = Listener::new(|snapshot: firestore_bridge::firestore::QuerySnapshot| {
    ///     println!("{} users", snapshot.size());
    /// });
    /// let listener = firestore.collection("users")?.on_snapshot(listener, None).await?;
    /// println!("listening as {}", listener.id());
    /// # Ok(())
    /// # }
    /// ```
    fn on_snapshot(
        &self,
        listener: Listener<QuerySnapshot>,
        options: Option<ListenOptions>,
    ) -> impl Future<Output = Result<Listener<QuerySnapshot>, FirebaseError>> + Send {
        let descriptor = self.descriptor().clone();
        let inner = Arc::clone(self.firestore_inner());
        async move {
            let mut args = descriptor.to_args()?;
            args.push(serde_json::to_value(options)?);
            let tag = inner.date_tag;
            listener::subscribe(
                Arc::clone(&inner),
                BridgeMethod::CollectionOnSnapshot,
                descriptor.path,
                args,
                listener,
                move |payload| QuerySnapshot::from_payload(payload, tag),
            )
            .await
        }
    }
}

/// A query over one collection
#[derive(Clone)]
pub struct Query {
    descriptor: QueryDescriptor,
    firestore: Arc<FirestoreInner>,
}

impl Query {
    /// Operations in call order
    pub fn ops(&self) -> &[QueryOp] {
        &self.descriptor.ops
    }
}

impl Queryable for Query {
    fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    fn firestore_inner(&self) -> &Arc<FirestoreInner> {
        &self.firestore
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("path", &self.descriptor.path)
            .field("ops", &self.descriptor.ops)
            .finish()
    }
}
