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

// (See basic.rs first)
//
// Subscriptions, tag invalidation, and optimistic mutations
//
// Watch the tracing log for:
//
//   "optimistic": the cart shows the new item before the backend confirms
//   "store":      the authoritative refetch after the mutation's tags are
//                  invalidated (the backend added the price; the optimistic
//                  guess didn't know it)
//   "revert":     the rollback after a mutation against a dead backend
//   "focus":      the forced refetch when the window regains focus

const CACHE_SIZE: u64 = 1024 * 1024; // 1 MiB

#[main]
async fn main() {
    utils::init_tracing();

    let backend = utils::Backend::default();
    let base_url = utils::serve(&backend).await;
    tracing::info!("backend at: {}", base_url);

    let cache = MokaQueryCache::new(
        Cache::builder()
            .name("queries")
            .for_query_results()
            .max_capacity(CACHE_SIZE)
            .build(),
    );

    let client = QueryClient::new(
        ClientConfiguration::default(),
        ReqwestTransport::new(base_url),
        cache,
        MemoryCredentialStore::new(),
    );

    client
        .login("/auth/login", json!({"email": "somebody@example.org", "password": "hunter2"}))
        .await
        .expect("login");

    let cart = QueryEndpoint::new("cart", "/cart")
        .tag("Cart")
        .refetch_on_focus(true);
    let add_to_cart = MutationEndpoint::new("addToCart", "/cart").invalidates("Cart");

    let mut subscription = client
        .subscribe(&cart, QueryParams::new())
        .await
        .expect("subscribe");
    tracing::info!("cart starts as: {}", subscription.current());

    // The optimistic patch appends the item without a price; the backend knows
    // the price, and the invalidation refetch reconciles

    let item = json!({"id": "svc-1", "qty": 1});
    let optimistic_item = item.clone();

    client
        .mutate(
            &add_to_cart,
            QueryParams::new(),
            Some(item),
            Some(OptimisticUpdate::new(&cart, QueryParams::new(), move |value| {
                if let Some(items) = value.as_array_mut() {
                    items.push(optimistic_item.clone());
                }
            })),
        )
        .await
        .expect("add to cart");

    tracing::info!("cart after add: {}", subscription.current());

    // Against a dead backend the optimistic patch is rolled back and the error
    // surfaces

    let offline = QueryClient::new(
        ClientConfiguration::default(),
        ReqwestTransport::new("http://127.0.0.1:9"),
        client.cache().clone(),
        MemoryCredentialStore::new(),
    );

    let result = offline
        .mutate(
            &MutationEndpoint::new("clearCart", "/cart").method(http::Method::DELETE),
            QueryParams::new(),
            None,
            Some(OptimisticUpdate::new(&cart, QueryParams::new(), |value| {
                *value = json!([]);
            })),
        )
        .await;
    tracing::info!("offline mutation failed as expected: {}", result.expect_err("offline"));

    let contents = client.fetch(&cart, QueryParams::new()).await.expect("cart");
    tracing::info!("cart survived the failed mutation: {}", contents);

    // A window-focus event forces a refetch of subscribed queries that opted in

    client.notify_focus().await;
    tracing::info!("cart after focus refetch: {}", subscription.current());
}
