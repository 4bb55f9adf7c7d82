use {
    axum::{Json, extract::State, http::header::*, response::*},
    serde_json::{Value, json},
    std::sync::{atomic::*, *},
    tokio::net::*,
    tracing_subscriber::prelude::*,
};

#[allow(dead_code)]
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_query_client=debug".into()),
        )
        .init();
}

//
// Backend
//

// A tiny salon-portal backend for the demos: access tokens are valid for one
// generation, and bumping the generation invalidates all of them at once.
#[derive(Clone, Default)]
pub struct Backend {
    pub generation: Arc<AtomicU64>,
    pub cart: Arc<Mutex<Vec<Value>>>,
}

impl Backend {
    pub fn router(&self) -> axum::Router {
        use axum::routing::*;

        axum::Router::default()
            .route("/auth/login", post(login_handler))
            .route("/auth/refresh", post(refresh_handler))
            .route("/admin/expire", post(expire_handler))
            .route("/salons", get(salons_handler))
            .route("/cart", get(cart_handler).post(add_to_cart_handler))
            .with_state(self.clone())
            .layer(tower_http::trace::TraceLayer::new_for_http())
    }

    fn access_token(&self) -> String {
        format!("access-{}", self.generation.load(Ordering::Relaxed))
    }
}

// Unlike access tokens, the refresh token survives expiry
const REFRESH_TOKEN: &str = "refresh-token";

// Serve on an ephemeral port; returns the base URL
#[allow(dead_code)]
pub async fn serve(backend: &Backend) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("TcpListener::bind");
    let address = listener.local_addr().expect("local_addr");

    let router = backend.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("axum::serve");
    });

    format!("http://{}", address)
}

async fn login_handler(State(backend): State<Backend>) -> Json<Value> {
    Json(json!({
        "accessToken": backend.access_token(),
        "refreshToken": REFRESH_TOKEN,
        "user": {"id": "u-1", "name": "somebody"},
    }))
}

async fn refresh_handler(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    if body.get("refreshToken").and_then(Value::as_str) == Some(REFRESH_TOKEN) {
        Json(json!({
            "accessToken": backend.access_token(),
            "refreshToken": REFRESH_TOKEN,
        }))
        .into_response()
    } else {
        axum::http::StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn expire_handler(State(backend): State<Backend>) -> Json<Value> {
    backend.generation.fetch_add(1, Ordering::Relaxed);
    Json(json!({"expired": true}))
}

async fn salons_handler() -> impl IntoResponse {
    (
        // The server decides how long this listing may be served from cache
        [("xx-cache-ttl", "2s")],
        Json(json!([
            {"id": "s-1", "name": "Curl Up & Dye", "city": "haifa"},
            {"id": "s-2", "name": "The Mane Event", "city": "haifa"},
        ])),
    )
}

async fn cart_handler(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&backend, &headers) {
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    }
    Json(Value::Array(backend.cart.lock().expect("cart lock").clone())).into_response()
}

async fn add_to_cart_handler(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(item): Json<Value>,
) -> Response {
    if !authorized(&backend, &headers) {
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    }

    // The backend knows the price; the optimistic guess doesn't
    let mut item = item;
    if let Some(item) = item.as_object_mut() {
        item.insert("price".into(), json!(500));
    }

    let mut cart = backend.cart.lock().expect("cart lock");
    cart.push(item);
    Json(Value::Array(cart.clone())).into_response()
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        == Some(backend.access_token().as_str())
}
