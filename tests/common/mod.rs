#![allow(dead_code)]

use {
    moka::future::Cache,
    serde_json::{Value, json},
    std::{
        pin::*,
        sync::*,
        task::{Context, Poll},
        time::*,
    },
    tower::Service,
    tower_query_client::{
        cache::{implementation::moka::*, *},
        client::*,
        credentials::*,
        error::*,
        request::*,
    },
    tracing_subscriber::prelude::*,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .try_init();
}

pub type Handler = Box<dyn FnMut(&ApiRequest) -> Result<ApiResponse, TransportError> + Send>;

//
// FakeBackend
//

/// Programmable transport: a handler closure plus a call log and an optional
/// artificial latency (for tests that need genuinely overlapping requests).
///
/// Clones share state.
#[derive(Clone)]
pub struct FakeBackend {
    inner: Arc<FakeBackendInner>,
}

struct FakeBackendInner {
    handler: Mutex<Handler>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(
        handler: impl FnMut(&ApiRequest) -> Result<ApiResponse, TransportError> + 'static + Send,
    ) -> Self {
        Self {
            inner: Arc::new(FakeBackendInner {
                handler: Mutex::new(Box::new(handler)),
                latency: Mutex::new(Duration::ZERO),
                calls: Mutex::new(Vec::default()),
            }),
        }
    }

    pub fn set_handler(
        &self,
        handler: impl FnMut(&ApiRequest) -> Result<ApiResponse, TransportError> + 'static + Send,
    ) {
        *self.inner.handler.lock().expect("handler lock") = Box::new(handler);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock().expect("latency lock") = latency;
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.ends_with(path))
            .count()
    }
}

impl Service<ApiRequest> for FakeBackend {
    type Response = ApiResponse;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send>>;

    fn poll_ready(&mut self, _context: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let latency = *inner.latency.lock().expect("latency lock");
            if latency > Duration::ZERO {
                tokio::time::sleep(latency).await;
            }

            inner
                .calls
                .lock()
                .expect("calls lock")
                .push(format!("{} {}", request.method, request.path));

            let mut handler = inner.handler.lock().expect("handler lock");
            (*handler)(&request)
        })
    }
}

//
// Helpers
//

pub type TestClient = QueryClient<FakeBackend, MokaQueryCache, MemoryCredentialStore>;

pub fn moka_cache() -> MokaQueryCache {
    MokaQueryCache::new(Cache::builder().for_query_results().max_capacity(1024 * 1024).build())
}

pub fn client_over(backend: &FakeBackend, store: MemoryCredentialStore) -> TestClient {
    QueryClient::new(
        ClientConfiguration::default(),
        backend.clone(),
        moka_cache(),
        store,
    )
}

/// A handler for a backend that accepts `good_token` bearers, rejects everything
/// else with 401, and answers the refresh endpoint from `refresh_outcome`.
pub fn bearer_checked_handler(
    good_token: &'static str,
    refresh_outcome: impl Fn() -> Result<ApiResponse, TransportError> + 'static + Send,
) -> impl FnMut(&ApiRequest) -> Result<ApiResponse, TransportError> + 'static + Send {
    move |request| {
        if request.path == "/auth/refresh" {
            return refresh_outcome();
        }

        if request.bearer() == Some(good_token) {
            Ok(ApiResponse::new(
                http::StatusCode::OK,
                json!({"path": request.path}),
            ))
        } else {
            Ok(ApiResponse::new(http::StatusCode::UNAUTHORIZED, Value::Null))
        }
    }
}

pub fn ok(body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::new(http::StatusCode::OK, body))
}
