//! Scripted in-memory [`SearchClient`] for unit tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::client::{
    ClientError, IndexRequest, IndexResponse, PutTemplateRequest, SearchClient, SearchRequest,
    SearchResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateBehavior {
    Present,
    Missing,
    Broken,
}

pub(crate) struct FakeClient {
    /// Number of leading failures per operation; `u32::MAX` fails forever.
    ping_failures: AtomicU32,
    index_failures: AtomicU32,
    template: Mutex<TemplateBehavior>,
    put_fails: AtomicBool,
    hold_index: AtomicBool,
    released: Notify,

    pub pings: AtomicU32,
    pub index_calls: AtomicU32,
    pub template_checks: AtomicU32,
    pub index_times: Mutex<Vec<Instant>>,
    pub index_requests: Mutex<Vec<IndexRequest>>,
    pub put_requests: Mutex<Vec<PutTemplateRequest>>,
}

impl FakeClient {
    pub fn healthy() -> Self {
        FakeClient {
            ping_failures: AtomicU32::new(0),
            index_failures: AtomicU32::new(0),
            template: Mutex::new(TemplateBehavior::Present),
            put_fails: AtomicBool::new(false),
            hold_index: AtomicBool::new(false),
            released: Notify::new(),
            pings: AtomicU32::new(0),
            index_calls: AtomicU32::new(0),
            template_checks: AtomicU32::new(0),
            index_times: Mutex::new(Vec::new()),
            index_requests: Mutex::new(Vec::new()),
            put_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_pings(self, n: u32) -> Self {
        self.ping_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn failing_index(self, n: u32) -> Self {
        self.index_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn template(self, behavior: TemplateBehavior) -> Self {
        *self.template.lock().unwrap() = behavior;
        self
    }

    pub fn failing_put(self) -> Self {
        self.put_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make index calls wait for [`FakeClient::release_index`] before answering.
    pub fn holding_index(self) -> Self {
        self.hold_index.store(true, Ordering::SeqCst);
        self
    }

    /// Let held and future index calls proceed.
    pub fn release_index(&self) {
        self.hold_index.store(false, Ordering::SeqCst);
        self.released.notify_waiters();
    }

    pub fn puts(&self) -> usize {
        self.put_requests.lock().unwrap().len()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl SearchClient for FakeClient {
    async fn ping(&self) -> Result<(), ClientError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.ping_failures) {
            return Err(ClientError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        self.index_times.lock().unwrap().push(Instant::now());
        self.index_requests.lock().unwrap().push(request.clone());

        // Registered before the flag check so a concurrent release is not missed.
        let released = self.released.notified();
        if self.hold_index.load(Ordering::SeqCst) {
            released.await;
        }
        if Self::take_failure(&self.index_failures) {
            return Err(ClientError::Status {
                status: 503,
                body: "no shards available".into(),
            });
        }
        Ok(IndexResponse {
            index: request.index.clone(),
            id: format!("doc-{}", self.index_calls.load(Ordering::SeqCst)),
            version: Some(1),
            result: Some("created".into()),
        })
    }

    async fn get_template(&self, name: &str) -> Result<Value, ClientError> {
        self.template_checks.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.template.lock().unwrap();
        match behavior {
            TemplateBehavior::Present => {
                let mut body = serde_json::Map::new();
                body.insert(name.to_string(), json!({ "index_patterns": ["logs-*"] }));
                Ok(Value::Object(body))
            }
            TemplateBehavior::Missing => Err(ClientError::NotFound(format!("template {}", name))),
            TemplateBehavior::Broken => Err(ClientError::Status {
                status: 500,
                body: "internal error".into(),
            }),
        }
    }

    async fn put_template(&self, request: &PutTemplateRequest) -> Result<Value, ClientError> {
        self.put_requests.lock().unwrap().push(request.clone());
        if self.put_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 400,
                body: "mapper_parsing_exception".into(),
            });
        }
        *self.template.lock().unwrap() = TemplateBehavior::Present;
        Ok(json!({ "acknowledged": true }))
    }

    async fn search(&self, _request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        Ok(SearchResponse::default())
    }
}
