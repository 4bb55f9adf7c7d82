mod common;

use {
    common::*,
    serde_json::{Value, json},
    std::time::*,
    tower_query_client::{client::*, credentials::*, error::*, request::*},
};

#[tokio::test(flavor = "multi_thread")]
async fn at_most_one_refresh_for_concurrent_unauthorized() {
    init_tracing();

    let backend = FakeBackend::new(bearer_checked_handler("fresh", || {
        ok(json!({"accessToken": "fresh", "refreshToken": "refresh-2"}))
    }));
    backend.set_latency(Duration::from_millis(50));

    let store = MemoryCredentialStore::new_with(Credentials::new("stale", "refresh-1"));
    let client = client_over(&backend, store.clone());

    // Distinct endpoints, so the cache coalesces nothing and all five requests
    // fail authorization together
    let mut tasks = Vec::default();
    for index in 0..5 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let endpoint = QueryEndpoint::new(format!("query-{}", index), format!("/things/{}", index));
            client.fetch(&endpoint, QueryParams::new()).await
        }));
    }

    for task in tasks {
        let value = task.await.expect("join").expect("fetch");
        assert!(value["path"].as_str().expect("path").starts_with("/things/"));
    }

    assert_eq!(backend.calls_to("/auth/refresh"), 1);
    assert_eq!(
        store.get(),
        Some(Credentials::new("fresh", "refresh-2"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_rejection_is_terminal() {
    init_tracing();

    let backend = FakeBackend::new(bearer_checked_handler("never", || {
        Ok(ApiResponse::new(http::StatusCode::UNAUTHORIZED, Value::Null))
    }));
    backend.set_latency(Duration::from_millis(50));

    let store = MemoryCredentialStore::new_with(Credentials::new("stale", "dead"));
    let client = client_over(&backend, store.clone());

    let mut tasks = Vec::default();
    for index in 0..4 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let endpoint = QueryEndpoint::new(format!("query-{}", index), format!("/things/{}", index));
            client.fetch(&endpoint, QueryParams::new()).await
        }));
    }

    for task in tasks {
        let error = task.await.expect("join").expect_err("fetch should fail");
        assert!(matches!(error, ClientError::Unauthenticated));
    }

    // Every queued caller adopted the one rejected refresh
    assert_eq!(backend.calls_to("/auth/refresh"), 1);
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn second_unauthorized_is_terminal() {
    init_tracing();

    // The refresh succeeds, but the backend rejects the retried request too
    let backend = FakeBackend::new(bearer_checked_handler("unobtainable", || {
        ok(json!({"accessToken": "fresh", "refreshToken": "refresh-2"}))
    }));

    let store = MemoryCredentialStore::new_with(Credentials::new("stale", "refresh-1"));
    let client = client_over(&backend, store);

    let endpoint = QueryEndpoint::new("bookings", "/bookings");
    let error = client
        .fetch(&endpoint, QueryParams::new())
        .await
        .expect_err("fetch should fail");

    assert!(matches!(error, ClientError::Unauthenticated));
    assert_eq!(backend.calls_to("/auth/refresh"), 1);

    // Original attempt and exactly one retry; never more
    assert_eq!(backend.calls_to("/bookings"), 2);
}

#[tokio::test]
async fn unauthorized_without_credentials_never_refreshes() {
    init_tracing();

    let backend = FakeBackend::new(bearer_checked_handler("any", || {
        ok(json!({"accessToken": "any", "refreshToken": "any"}))
    }));

    let client = client_over(&backend, MemoryCredentialStore::new());

    let endpoint = QueryEndpoint::new("bookings", "/bookings");
    let error = client
        .fetch(&endpoint, QueryParams::new())
        .await
        .expect_err("fetch should fail");

    assert!(matches!(error, ClientError::Unauthenticated));
    assert_eq!(backend.calls_to("/auth/refresh"), 0);
}

#[tokio::test]
async fn transient_refresh_failure_is_not_fatal() {
    init_tracing();

    let backend = FakeBackend::new(bearer_checked_handler("fresh", || {
        Err(TransportError::Connect("refused".into()))
    }));

    let store = MemoryCredentialStore::new_with(Credentials::new("stale", "refresh-1"));
    let client = client_over(&backend, store.clone());

    let endpoint = QueryEndpoint::new("bookings", "/bookings");
    let error = client
        .fetch(&endpoint, QueryParams::new())
        .await
        .expect_err("fetch should fail");

    assert!(matches!(error, ClientError::Network(_)));

    // The session is intact; the next authorization failure retries the refresh
    assert_eq!(store.get(), Some(Credentials::new("stale", "refresh-1")));

    backend.set_handler(bearer_checked_handler("fresh", || {
        ok(json!({"accessToken": "fresh", "refreshToken": "refresh-2"}))
    }));

    client
        .fetch(&endpoint, QueryParams::new())
        .await
        .expect("fetch after recovery");
    assert_eq!(store.get(), Some(Credentials::new("fresh", "refresh-2")));
}

#[tokio::test]
async fn login_stores_credentials_and_logout_clears_them() {
    init_tracing();

    let backend = FakeBackend::new(|request| {
        if request.path == "/auth/login" {
            ok(json!({
                "accessToken": "a-1",
                "refreshToken": "r-1",
                "user": {"id": "u-1"},
            }))
        } else {
            ok(Value::Null)
        }
    });

    let store = MemoryCredentialStore::new();
    let client = client_over(&backend, store.clone());

    let body = client
        .login("/auth/login", json!({"email": "x", "password": "y"}))
        .await
        .expect("login");
    assert_eq!(body["user"]["id"], json!("u-1"));
    assert_eq!(store.get(), Some(Credentials::new("a-1", "r-1")));

    client.logout(Some("/auth/logout")).await;
    assert_eq!(store.get(), None);
    assert_eq!(backend.calls_to("/auth/logout"), 1);
}

#[tokio::test]
async fn file_store_survives_reconstruction() {
    init_tracing();

    let path = std::env::temp_dir().join(format!(
        "tower-query-client-test-{}.json",
        std::process::id()
    ));

    let store = JsonFileCredentialStore::new(&path);
    store.set(Credentials::new("a-1", "r-1"));

    // A "reload": a fresh store over the same file
    let reloaded = JsonFileCredentialStore::new(&path);
    assert_eq!(reloaded.get(), Some(Credentials::new("a-1", "r-1")));

    reloaded.clear();
    let reloaded = JsonFileCredentialStore::new(&path);
    assert_eq!(reloaded.get(), None);
}
