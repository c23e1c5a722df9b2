//! In-process bridge that records calls and replays scripted responses

#![allow(dead_code)]

use firestore_bridge::firestore::{Bridge, BridgeMethod, Firestore, Settings};
use firestore_bridge::BridgeError;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type Payload = Result<Value, BridgeError>;

/// Bridge double
///
/// One-shot calls pop the next scripted response for their method (or return
/// `null`). Streaming calls replay a scripted payload list if one was queued,
/// otherwise they stay open and are fed through [`RecordingBridge::emit`].
#[derive(Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<(BridgeMethod, Vec<Value>)>>,
    responses: Mutex<HashMap<BridgeMethod, VecDeque<Payload>>>,
    scripted_streams: Mutex<HashMap<BridgeMethod, VecDeque<Vec<Payload>>>>,
    live_streams: Mutex<Vec<mpsc::UnboundedSender<Payload>>>,
}

impl RecordingBridge {
    pub fn new() -> Arc<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Arc::new(Self::default())
    }

    /// Queue the result of the next one-shot call to `method`
    pub fn respond(&self, method: BridgeMethod, result: Payload) {
        self.responses
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(result);
    }

    /// Queue a finite stream for the next subscription to `method`
    pub fn script_stream(&self, method: BridgeMethod, items: Vec<Payload>) {
        self.scripted_streams
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(items);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<(BridgeMethod, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments of the last call to `method`
    pub fn last_args(&self, method: BridgeMethod) -> Option<Vec<Value>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(m, _)| *m == method)
            .map(|(_, args)| args)
    }

    /// Wait until `count` live subscriptions are open
    pub async fn wait_for_streams(&self, count: usize) {
        for _ in 0..1_000 {
            if self.live_streams.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("bridge never saw {} subscriptions", count);
    }

    /// Push an item into live subscription `index`
    pub fn emit(&self, index: usize, item: Payload) {
        let streams = self.live_streams.lock().unwrap();
        streams[index].send(item).expect("subscription task is gone");
    }

    /// End live subscription `index`
    pub fn close(&self, index: usize) {
        let (closed, _) = mpsc::unbounded_channel();
        self.live_streams.lock().unwrap()[index] = closed;
    }
}

impl Bridge for RecordingBridge {
    fn call(
        &self,
        method: BridgeMethod,
        args: Vec<Value>,
    ) -> BoxFuture<'static, Result<Value, BridgeError>> {
        self.calls.lock().unwrap().push((method, args));
        let result = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Value::Null));
        Box::pin(async move { result })
    }

    fn subscribe(
        &self,
        method: BridgeMethod,
        args: Vec<Value>,
    ) -> BoxStream<'static, Result<Value, BridgeError>> {
        self.calls.lock().unwrap().push((method, args));

        let scripted = self
            .scripted_streams
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front);
        if let Some(items) = scripted {
            return Box::pin(async_stream::stream! {
                for item in items {
                    yield item;
                }
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.live_streams.lock().unwrap().push(tx);
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Client over a fresh recording bridge
pub async fn firestore() -> (Firestore, Arc<RecordingBridge>) {
    firestore_with(Settings::default()).await
}

/// Client with explicit settings over a fresh recording bridge
pub async fn firestore_with(settings: Settings) -> (Firestore, Arc<RecordingBridge>) {
    let bridge = RecordingBridge::new();
    let firestore = Firestore::new(bridge.clone(), settings).await;
    (firestore, bridge)
}
