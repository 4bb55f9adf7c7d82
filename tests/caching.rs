mod common;

use {
    common::*,
    http::{HeaderName, HeaderValue},
    serde_json::{Value, json},
    std::{sync::*, time::*},
    tower_query_client::{cache::*, client::*, credentials::*, request::*},
};

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_identical_queries_coalesce() {
    init_tracing();

    let backend = FakeBackend::new(|_request| ok(json!({"salons": ["s-1", "s-2"]})));
    backend.set_latency(Duration::from_millis(100));

    let client = client_over(&backend, MemoryCredentialStore::new());

    let mut tasks = Vec::default();
    for _ in 0..5 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let endpoint = QueryEndpoint::new("salons", "/salons");
            client.fetch(&endpoint, QueryParams::new().with("city", "haifa")).await
        }));
    }

    let mut values = Vec::default();
    for task in tasks {
        values.push(task.await.expect("join").expect("fetch"));
    }

    assert_eq!(backend.calls_to("/salons"), 1);
    for value in &values {
        assert_eq!(value, &values[0]);
    }
}

#[tokio::test]
async fn fresh_entries_are_served_without_network() {
    init_tracing();

    let backend = FakeBackend::new(|_request| ok(json!({"items": []})));
    let client = client_over(&backend, MemoryCredentialStore::new());

    let endpoint = QueryEndpoint::new("cart", "/cart").ttl(Duration::from_millis(80));

    client.fetch(&endpoint, QueryParams::new()).await.expect("fetch");
    client.fetch(&endpoint, QueryParams::new()).await.expect("fetch within ttl");
    assert_eq!(backend.calls_to("/cart"), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;

    client.fetch(&endpoint, QueryParams::new()).await.expect("fetch past ttl");
    assert_eq!(backend.calls_to("/cart"), 2);
}

#[tokio::test]
async fn server_driven_ttl_overrides_endpoint_ttl() {
    init_tracing();

    let backend = FakeBackend::new(|_request| {
        Ok(ApiResponse::new(http::StatusCode::OK, json!({"items": []})).with_header(
            HeaderName::from_static(XX_CACHE_TTL),
            HeaderValue::from_static("50ms"),
        ))
    });
    let client = client_over(&backend, MemoryCredentialStore::new());

    // The endpoint says ten seconds; the server says 50 milliseconds
    let endpoint = QueryEndpoint::new("cart", "/cart").ttl(Duration::from_secs(10));

    client.fetch(&endpoint, QueryParams::new()).await.expect("fetch");
    tokio::time::sleep(Duration::from_millis(120)).await;
    client.fetch(&endpoint, QueryParams::new()).await.expect("fetch past server ttl");

    assert_eq!(backend.calls_to("/cart"), 2);
}

#[tokio::test]
async fn invalidation_refetches_subscribed_queries() {
    init_tracing();

    let cart = Arc::new(Mutex::new(vec![json!({"id": "svc-1", "qty": 1})]));

    let handler_cart = cart.clone();
    let backend = FakeBackend::new(move |request| {
        if request.path == "/cart" && request.method == http::Method::POST {
            handler_cart
                .lock()
                .expect("cart lock")
                .push(json!({"id": "svc-2", "qty": 1}));
        }
        ok(Value::Array(handler_cart.lock().expect("cart lock").clone()))
    });

    let client = client_over(&backend, MemoryCredentialStore::new());

    let cart_query = QueryEndpoint::new("cart", "/cart").tag("Cart");
    let add_to_cart = MutationEndpoint::new("addToCart", "/cart").invalidates("Cart");

    let subscription = client
        .subscribe(&cart_query, QueryParams::new())
        .await
        .expect("subscribe");
    assert_eq!(subscription.current().as_array().map(Vec::len), Some(1));

    client
        .mutate(&add_to_cart, QueryParams::new(), Some(json!({"id": "svc-2", "qty": 1})), None)
        .await
        .expect("mutate");

    // The refetch triggered by the invalidation already published
    assert_eq!(subscription.current().as_array().map(Vec::len), Some(2));
    assert_eq!(backend.calls_to("/cart"), 3); // initial fetch, mutation, refetch
}

#[tokio::test]
async fn unsubscribed_queries_are_evicted_not_refetched() {
    init_tracing();

    let backend = FakeBackend::new(|request| {
        if request.path == "/favorites" {
            ok(json!(["s-1"]))
        } else {
            ok(Value::Null)
        }
    });

    let client = client_over(&backend, MemoryCredentialStore::new());

    let favorites = QueryEndpoint::new("favorites", "/favorites").tag("Favorites");
    let toggle = MutationEndpoint::new("toggleFavorite", "/favorites/s-1").invalidates("Favorites");

    let subscription = client
        .subscribe(&favorites, QueryParams::new())
        .await
        .expect("subscribe");
    drop(subscription);

    client
        .mutate(&toggle, QueryParams::new(), None, None)
        .await
        .expect("mutate");

    // No live subscription, no refetch; the tagged entry was simply evicted
    assert_eq!(backend.calls_to("/favorites"), 1);

    client.fetch(&favorites, QueryParams::new()).await.expect("fetch");
    assert_eq!(backend.calls_to("/favorites"), 2);
}

#[tokio::test]
async fn focus_refetches_only_queries_that_opted_in() {
    init_tracing();

    let backend = FakeBackend::new(|_request| ok(json!([])));
    let client = client_over(&backend, MemoryCredentialStore::new());

    let bookings = QueryEndpoint::new("bookings", "/bookings").refetch_on_focus(true);
    let salons = QueryEndpoint::new("salons", "/salons");

    let _bookings_subscription = client
        .subscribe(&bookings, QueryParams::new())
        .await
        .expect("subscribe");
    let _salons_subscription = client
        .subscribe(&salons, QueryParams::new())
        .await
        .expect("subscribe");

    client.notify_focus().await;

    assert_eq!(backend.calls_to("/bookings"), 2);
    assert_eq!(backend.calls_to("/salons"), 1);
}

#[tokio::test]
async fn logout_clears_the_cache() {
    init_tracing();

    let backend = FakeBackend::new(|_request| ok(json!(["s-1"])));
    let client = client_over(&backend, MemoryCredentialStore::new());

    let salons = QueryEndpoint::new("salons", "/salons");

    client.fetch(&salons, QueryParams::new()).await.expect("fetch");
    client.logout(None).await;
    client.fetch(&salons, QueryParams::new()).await.expect("fetch after logout");

    assert_eq!(backend.calls_to("/salons"), 2);
}

#[tokio::test]
async fn tiered_cache_serves_from_either_tier() {
    init_tracing();

    let first = moka_cache();
    let next = moka_cache();
    let tiered = TieredCache::new(first.clone(), next.clone());

    let key = QueryKey::new("salons".into(), QueryParams::new());
    let entry = Arc::new(CacheEntry::new(
        Arc::new(json!(["s-1"])),
        Duration::from_secs(60),
        Duration::from_secs(60),
        vec![Tag::new("Salons")],
    ));

    next.put(key.clone(), entry.clone()).await;
    assert!(tiered.get(&key).await.is_some());

    tiered.invalidate(&[Tag::new("Salons")]).await;
    assert!(tiered.get(&key).await.is_none());

    first.put(key.clone(), entry.clone()).await;
    tiered.remove(&key).await;
    assert!(tiered.get(&key).await.is_none());
}
