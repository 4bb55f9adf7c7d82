mod utils;

use {
    moka::future::Cache,
    serde_json::json,
    std::time::*,
    tokio::*,
    tower_query_client::{
        cache::{implementation::moka::*, *},
        client::*,
        credentials::*,
        request::*,
        transport::*,
    },
};

// A scripted walkthrough of the query client against a local axum backend
//
// Pay attention to the tracing log to see what the pipeline and the cache are
// doing: the login, the cache hit on the second salon fetch, and the
// single-flight refresh-and-retry after the backend expires the session

// Note that this is *not* a promise for the actual maximum memory use,
// but is rather a limit for the total of cache entry weights, which are themselves estimates
const CACHE_SIZE: u64 = 1024 * 1024; // 1 MiB

#[main]
async fn main() {
    utils::init_tracing();

    let backend = utils::Backend::default();
    let base_url = utils::serve(&backend).await;
    tracing::info!("backend at: {}", base_url);

    // Construct a Moka cache according to your preferences

    let cache = Cache::builder()
        .name("queries")
        .for_query_results()
        .max_capacity(CACHE_SIZE)
        .eviction_listener(|key, _value, cause| {
            tracing::debug!("evict ({:?}): {}", cause, key);
        })
        .build();

    let cache = MokaQueryCache::new(cache);

    let client = QueryClient::new(
        ClientConfiguration::default().default_ttl(Duration::from_secs(30)),
        ReqwestTransport::new(base_url),
        cache,
        MemoryCredentialStore::new(),
    );

    // Declare endpoints once; TTL, retention, and tags live here

    let salons = QueryEndpoint::new("salons", "/salons").tag("Salons");
    let cart = QueryEndpoint::new("cart", "/cart")
        .ttl(Duration::from_secs(5))
        .retention(Duration::from_secs(60))
        .tag("Cart");

    let user = client
        .login("/auth/login", json!({"email": "somebody@example.org", "password": "hunter2"}))
        .await
        .expect("login");
    tracing::info!("logged in: {}", user["user"]["name"]);

    // The second fetch is a cache hit: no network call

    let listing = client.fetch(&salons, QueryParams::new()).await.expect("salons");
    tracing::info!("{} salons", listing.as_array().map(Vec::len).unwrap_or_default());
    client.fetch(&salons, QueryParams::new()).await.expect("salons again");

    // Expire the session server-side; the next authenticated fetch gets a 401,
    // refreshes once, and retries transparently

    client
        .mutate(
            &MutationEndpoint::new("expire", "/admin/expire"),
            QueryParams::new(),
            None,
            None,
        )
        .await
        .expect("expire");

    let contents = client.fetch(&cart, QueryParams::new()).await.expect("cart");
    tracing::info!("cart: {}", contents);

    tracing::info!(
        "session survived the expiry: {}",
        client.store().get().is_some()
    );
}
