//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use super::transport::{ApiRequest, Method, Transport};
use super::ConsoleClient;
use crate::error::{ConsoleError, ConsoleResult};

type Key = (Method, String);

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<Key, VecDeque<ConsoleResult<Value>>>>,
    gates: Mutex<HashMap<Key, Arc<Notify>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response. The last queued response keeps being served.
    pub fn on(&self, method: Method, path: &str, response: ConsoleResult<Value>) -> &Self {
        self.responses
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    /// Requests to `path` wait until the returned handle is notified.
    pub fn hold(&self, method: Method, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().insert((method, path.to_string()), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    fn next_response(&self, key: &Key) -> ConsoleResult<Value> {
        let mut responses = self.responses.lock();
        match responses.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Err(ConsoleError::NotFound(format!("{} {}", key.0, key.1))),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> ConsoleResult<Value> {
        let key = (request.method, request.path.clone());
        self.calls.lock().push(request);

        let gate = self.gates.lock().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.next_response(&key)
    }
}

pub fn client(transport: &Arc<MockTransport>) -> ConsoleClient {
    ConsoleClient::new(transport.clone())
}
