//! Snapshot listener tests
//!
//! Live subscriptions are fed by hand through `RecordingBridge::emit`, so each
//! test controls exactly when payloads arrive.

mod support;

use firestore_bridge::firestore::{
    BridgeMethod, DocumentListen, DocumentSnapshot, FieldValue, FilterOperator, ListenOptions,
    Listener, MetadataChanges, QuerySnapshot, Queryable,
};
use firestore_bridge::{BridgeError, FirebaseError};
use serde_json::{json, Value};
use std::task::Poll;
use std::time::Duration;
use support::firestore;
use tokio::sync::mpsc;
use tokio_test::{assert_pending, task};

fn users_payload(ids: &[&str]) -> Value {
    let docs: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "exists": true, "id": id, "_data": { "name": id } }))
        .collect();
    json!({ "docs": docs })
}

/// Listener that forwards every snapshot into a channel
fn channel_listener<T: Send + 'static>() -> (Listener<T>, mpsc::UnboundedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = Listener::new(move |snapshot| {
        let _ = tx.send(snapshot);
    });
    (listener, rx)
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timed out waiting for snapshot")
        .expect("Listener channel closed")
}

/// Test: Query listener settles on the first payload and keeps delivering in order
#[tokio::test]
async fn test_query_listener_delivers_in_order() {
    let (firestore, bridge) = firestore().await;
    let users = firestore.collection("users").unwrap();
    let (listener, mut rx) = channel_listener::<QuerySnapshot>();
    let id = listener.id();

    let pending = tokio::spawn(async move { users.on_snapshot(listener, None).await });
    bridge.wait_for_streams(1).await;

    bridge.emit(0, Ok(users_payload(&["a"])));
    let listener = pending.await.unwrap().expect("Failed to subscribe");
    assert_eq!(listener.id(), id);

    bridge.emit(0, Ok(users_payload(&["a", "b"])));
    bridge.emit(0, Ok(users_payload(&[])));

    assert_eq!(next(&mut rx).await.size(), 1);
    let second = next(&mut rx).await;
    let ids: Vec<String> = second.iter().map(|doc| doc.id().to_string()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(next(&mut rx).await.is_empty());
}

/// Test: Query listener sends path, ops and options
#[tokio::test]
async fn test_query_listener_args() {
    let (firestore, bridge) = firestore().await;
    let query = firestore
        .collection("users")
        .unwrap()
        .where_("active", FilterOperator::Equal, true);

    let options = ListenOptions::from(MetadataChanges::Include);
    let pending =
        tokio::spawn(async move { query.on_snapshot(Listener::noop(), Some(options)).await });
    bridge.wait_for_streams(1).await;
    bridge.emit(0, Ok(users_payload(&[])));
    pending.await.unwrap().unwrap();

    assert_eq!(
        bridge.last_args(BridgeMethod::CollectionOnSnapshot),
        Some(vec![
            json!("users"),
            json!([{ "queryType": "where", "value": { "fieldPath": "active", "opStr": "==", "value": true } }]),
            json!({ "includeMetadataChanges": true })
        ])
    );
}

/// Test: Subscription stays pending until a payload is delivered
#[tokio::test]
async fn test_subscription_pending_until_first_payload() {
    let (firestore, bridge) = firestore().await;
    let users = firestore.collection("users").unwrap();

    let mut subscription = task::spawn(users.on_snapshot(Listener::noop(), None));
    assert_pending!(subscription.poll());
    assert_eq!(bridge.calls().len(), 2);

    // A delivery error is skipped and does not settle the subscription
    bridge.emit(0, Err(BridgeError::new("transient")));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_pending!(subscription.poll());

    bridge.emit(0, Ok(users_payload(&["a"])));
    let mut settled = None;
    for _ in 0..100 {
        if let Poll::Ready(result) = subscription.poll() {
            settled = Some(result);
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(settled.expect("Subscription never settled").is_ok());
}

/// Test: Errors and undecodable payloads are swallowed
#[tokio::test]
async fn test_errors_are_swallowed() {
    let (firestore, bridge) = firestore().await;
    bridge.script_stream(
        BridgeMethod::CollectionOnSnapshot,
        vec![
            Err(BridgeError::with_code("unavailable", "offline")),
            Ok(json!({ "docs": 42 })),
            Ok(users_payload(&["a"])),
            Ok(users_payload(&["a", "b"])),
        ],
    );
    let (listener, mut rx) = channel_listener::<QuerySnapshot>();

    let users = firestore.collection("users").unwrap();
    users.on_snapshot(listener, None).await.unwrap();

    assert_eq!(next(&mut rx).await.size(), 1);
    assert_eq!(next(&mut rx).await.size(), 2);
}

/// Test: A stream that ends without payloads cancels the subscription
#[tokio::test]
async fn test_empty_stream_cancels() {
    let (firestore, bridge) = firestore().await;
    bridge.script_stream(BridgeMethod::CollectionOnSnapshot, Vec::new());
    bridge.script_stream(
        BridgeMethod::DocOnSnapshot,
        vec![Err(BridgeError::new("permission-denied"))],
    );

    let users = firestore.collection("users").unwrap();
    let err = users.on_snapshot(Listener::noop(), None).await.unwrap_err();
    assert!(matches!(err, FirebaseError::Cancelled));

    let doc = users.doc("u1").unwrap();
    let err = doc
        .on_snapshot(Listener::<DocumentSnapshot>::noop())
        .await
        .unwrap_err();
    assert!(matches!(err, FirebaseError::Cancelled));
}

/// Test: Registry records each subscription under the listener's id
#[tokio::test]
async fn test_registry_tracks_reused_listener() {
    let (firestore, bridge) = firestore().await;
    bridge.script_stream(BridgeMethod::CollectionOnSnapshot, vec![Ok(users_payload(&[]))]);
    bridge.script_stream(
        BridgeMethod::DocOnSnapshot,
        vec![Ok(json!({ "exists": false, "id": "u1", "_data": null }))],
    );
    assert!(firestore.listeners().is_empty());

    let users = firestore.collection("users").unwrap();
    let listener = users.on_snapshot(Listener::noop(), None).await.unwrap();
    let entry = firestore.listeners().lookup(listener.id()).unwrap();
    assert_eq!(entry.method, BridgeMethod::CollectionOnSnapshot);
    assert_eq!(entry.target, "users");
    assert_eq!(entry.subscriptions, 1);

    // A second listener gets its own entry
    let doc_listener: Listener<DocumentSnapshot> = Listener::noop();
    let first = users.doc("u1").unwrap().on_snapshot(doc_listener.clone()).await.unwrap();
    assert_eq!(first.id(), doc_listener.id());
    assert_eq!(firestore.listeners().len(), 2);

    bridge.script_stream(
        BridgeMethod::DocOnSnapshot,
        vec![Ok(json!({ "exists": false, "id": "u2", "_data": null }))],
    );
    // Reusing it for another document bumps the count instead
    users.doc("u2").unwrap().on_snapshot(doc_listener.clone()).await.unwrap();
    let entry = firestore.listeners().lookup(doc_listener.id()).unwrap();
    assert_eq!(entry.subscriptions, 2);
    assert_eq!(entry.target, "users/u2");
    assert_eq!(firestore.listeners().len(), 2);
}

/// Test: Document listener with callback only
#[tokio::test]
async fn test_document_listener_callback_form() {
    let (firestore, bridge) = firestore().await;
    bridge.script_stream(
        BridgeMethod::DocOnSnapshot,
        vec![Ok(json!({
            "exists": true,
            "id": "u1",
            "_data": { "joined": "__DATE(1700000000000)" }
        }))],
    );
    let (listener, mut rx) = channel_listener::<DocumentSnapshot>();

    let doc = firestore.collection("users").unwrap().doc("u1").unwrap();
    doc.on_snapshot(listener).await.unwrap();

    assert_eq!(
        bridge.last_args(BridgeMethod::DocOnSnapshot),
        Some(vec![json!("users"), json!("u1")])
    );
    let snapshot = next(&mut rx).await;
    assert_eq!(
        snapshot.get("joined").and_then(FieldValue::as_timestamp).map(|t| t.to_millis()),
        Some(1_700_000_000_000)
    );
}

/// Test: Document listener with options sends them as a third argument
#[tokio::test]
async fn test_document_listener_options_form() {
    let (firestore, bridge) = firestore().await;
    let doc = firestore.collection("users").unwrap().doc("u1").unwrap();
    let options = ListenOptions::from(MetadataChanges::Exclude);

    let (listener, mut rx) = channel_listener::<DocumentSnapshot>();
    let pending = tokio::spawn({
        let doc = doc.clone();
        async move {
            doc.on_snapshot(DocumentListen::Options(options, Some(listener)))
                .await
        }
    });
    bridge.wait_for_streams(1).await;
    bridge.emit(0, Ok(json!({ "exists": true, "id": "u1", "_data": { "n": 1 } })));
    pending.await.unwrap().unwrap();

    assert_eq!(
        bridge.last_args(BridgeMethod::DocOnSnapshot),
        Some(vec![
            json!("users"),
            json!("u1"),
            json!({ "includeMetadataChanges": false })
        ])
    );
    assert_eq!(next(&mut rx).await.get("n").and_then(FieldValue::as_i64), Some(1));
}

/// Test: Options without a callback still settle
#[tokio::test]
async fn test_document_listener_options_without_callback() {
    let (firestore, bridge) = firestore().await;
    bridge.script_stream(
        BridgeMethod::DocOnSnapshot,
        vec![Ok(json!({ "exists": true, "id": "u1", "_data": {} }))],
    );

    let doc = firestore.collection("users").unwrap().doc("u1").unwrap();
    let listener = doc
        .on_snapshot(DocumentListen::Options(ListenOptions::default(), None))
        .await
        .unwrap();

    let entry = firestore.listeners().lookup(listener.id()).unwrap();
    assert_eq!(entry.target, "users/u1");
    assert_eq!(bridge.last_args(BridgeMethod::DocOnSnapshot).unwrap().len(), 3);
}
