//! Scripted backend for exercising the client without a server

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::client::ApiClient;
use super::envelope::Envelope;
use super::error::ApiError;
use super::transport::{ApiRequest, HttpBackend, Method};
use crate::auth::tokens::{MemoryTokenStorage, StoredSession};
use crate::auth::{CredentialStore, Navigator};

type Responder = dyn Fn(&ApiRequest, Option<&str>) -> Result<Envelope, ApiError> + Send + Sync;

/// A request as it reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

pub struct MockBackend {
    responder: Box<Responder>,
    calls: Mutex<Vec<Call>>,
    refresh_result: Mutex<Result<String, ApiError>>,
    refresh_calls: AtomicUsize,
    hold: AtomicBool,
    release: Notify,
    cookies: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest, Option<&str>) -> Result<Envelope, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            refresh_result: Mutex::new(Err(ApiError::Network("no refresh scripted".to_string()))),
            refresh_calls: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            cookies: Mutex::new(None),
        }
    }

    /// Answer every request with `Envelope::ok(echo)`.
    pub fn echo() -> Self {
        Self::new(|req, _| {
            Ok(Envelope::ok(json!({
                "method": req.method.to_string(),
                "path": req.path,
            })))
        })
    }

    pub fn with_refresh(self, result: Result<&str, ApiError>) -> Self {
        self.set_refresh(result);
        self
    }

    pub fn set_refresh(&self, result: Result<&str, ApiError>) {
        *self.refresh_result.lock().unwrap() = result.map(String::from);
    }

    /// Keep refresh calls pending until `release_refresh`.
    pub fn hold_refresh(self) -> Self {
        self.hold.store(true, Ordering::SeqCst);
        self
    }

    pub fn release_refresh(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn with_cookies(self, cookies: &str) -> Self {
        *self.cookies.lock().unwrap() = Some(cookies.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls().pop().expect("no calls recorded")
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpBackend for MockBackend {
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        self.calls.lock().unwrap().push(Call {
            method: request.method,
            path: request.path.clone(),
            params: request.params.clone(),
            body: request.body.clone(),
            token: token.map(String::from),
        });
        // Let other tasks interleave as they would on a real connection.
        tokio::task::yield_now().await;
        (self.responder)(request, token)
    }

    async fn refresh(&self) -> Result<String, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        tokio::task::yield_now().await;
        self.refresh_result.lock().unwrap().clone()
    }

    fn session_cookies(&self) -> Option<String> {
        self.cookies.lock().unwrap().clone()
    }
}

/// Accepts only `valid_token`, answering 401 otherwise.
pub fn expiring(
    valid_token: &'static str,
) -> impl Fn(&ApiRequest, Option<&str>) -> Result<Envelope, ApiError> + Send + Sync + 'static {
    move |req: &ApiRequest, token: Option<&str>| {
        if token == Some(valid_token) {
            Ok(Envelope::ok(json!({ "path": req.path })))
        } else {
            Ok(Envelope::failure(401, "access token expired"))
        }
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

pub fn test_client(
    backend: Arc<MockBackend>,
    token: Option<&str>,
) -> (ApiClient, Arc<MemoryTokenStorage>, Arc<RecordingNavigator>) {
    test_client_with_limit(backend, token, 256)
}

pub fn test_client_with_limit(
    backend: Arc<MockBackend>,
    token: Option<&str>,
    max_pending: usize,
) -> (ApiClient, Arc<MemoryTokenStorage>, Arc<RecordingNavigator>) {
    let storage = Arc::new(match token {
        Some(token) => MemoryTokenStorage::with_session(StoredSession {
            access_token: Some(token.to_string()),
            ..StoredSession::default()
        }),
        None => MemoryTokenStorage::default(),
    });
    let navigator = Arc::new(RecordingNavigator::default());
    let credentials = CredentialStore::open(storage.clone());
    let client = ApiClient::new(backend, credentials, navigator.clone(), max_pending);
    (client, storage, navigator)
}

/// Yield to the runtime until `condition` holds. After a burst of yields it
/// falls back to short sleeps so tasks on other worker threads can catch up.
pub async fn settle_until(mut condition: impl FnMut() -> bool) {
    for attempt in 0..3000 {
        if condition() {
            return;
        }
        if attempt < 1000 {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }
    panic!("condition not reached");
}
