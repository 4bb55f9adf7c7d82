use super::{
    super::{cache::*, credentials::*, error::*, layer::*, request::*, service::*},
    configuration::*,
    endpoint::*,
    mutation::*,
    subscription::*,
};

use {
    dashmap::{DashMap, mapref::entry::Entry},
    serde_json::Value,
    std::sync::*,
    tokio::sync::broadcast,
    tower::*,
};

/// Outcome of a query: a shared value or a shared error.
///
/// Both sides are cheap to clone because coalesced callers of one fetch all
/// receive the same outcome.
pub type QueryResult = Result<Arc<Value>, ClientError>;

type InflightMap = DashMap<QueryKey, broadcast::Sender<QueryResult>>;

//
// QueryClient
//

/// Query client.
///
/// The one layer every feature talks to the backend through: queries are cached
/// by endpoint + normalized parameters and coalesced while in flight, mutations
/// invalidate by tag and can patch the cache optimistically, and everything runs
/// through the authenticated request pipeline ([AuthnLayer](super::super::AuthnLayer)),
/// which this client builds around the transport it is given.
///
/// For more information and usage examples see the
/// [home page](https://github.com/tliron/tower-query-client).
///
/// Query handling
/// ==============
///
/// 1. [fetch](Self::fetch) computes the cache key. A cached entry younger than
///    its TTL is returned with no network call.
///
/// 2. Otherwise the caller tries to claim the key's in-flight slot. If another
///    fetch already holds it, the caller subscribes to that fetch's outcome:
///    one network call no matter how many callers. If the slot holder vanishes
///    without settling (cancellation), waiters race for the slot again.
///
/// 3. The slot holder re-checks freshness (a fetch may have settled between the
///    caller's check and the claim), then fetches: non-success statuses become
///    [Status](ClientError::Status) errors, successes are stored with the
///    endpoint's tags and windows (unless the response carries an
///    [XX_CACHE_TTL] header, which overrides the freshness window), and the new
///    value is published to subscribers.
///
/// Mutation handling
/// =================
///
/// 1. [mutate](Self::mutate) optionally applies an [OptimisticUpdate] first:
///    the target entry's value is patched in place and published, and the
///    previous entry is kept as the undo snapshot. No target entry, no patch.
///
/// 2. The request runs. On success, the mutation's declared tags are
///    invalidated: tagged entries are evicted, and every subscribed query with
///    an intersecting tag is refetched so subscribers converge on server truth.
///
/// 3. On failure, the snapshot is restored and published, and the error is
///    surfaced for user-facing messaging. Rollback restores the pre-patch value
///    exactly.
///
/// Cloning is cheap-ish (it clones the service stack) and clones share the
/// cache, the credential store, the subscriptions, and the refresh coordinator.
pub struct QueryClient<TransportT, CacheT, StoreT> {
    configuration: ClientConfiguration,
    service: AuthnService<TransportT, StoreT>,
    store: StoreT,
    cache: CacheT,
    registry: SubscriptionRegistry,
    inflight: Arc<InflightMap>,
}

impl<TransportT, CacheT, StoreT> QueryClient<TransportT, CacheT, StoreT>
where
    TransportT: 'static + Service<ApiRequest, Response = ApiResponse, Error = TransportError> + Clone + Send,
    TransportT::Future: Send,
    CacheT: QueryCache,
    StoreT: CredentialStore,
{
    /// Constructor.
    ///
    /// Installs the authenticated request pipeline around the transport; the
    /// refresh path comes from the configuration.
    pub fn new(
        configuration: ClientConfiguration,
        transport: TransportT,
        cache: CacheT,
        store: StoreT,
    ) -> Self {
        let service =
            AuthnLayer::new(store.clone(), configuration.refresh_path.clone()).layer(transport);

        Self {
            configuration,
            service,
            store,
            cache,
            registry: SubscriptionRegistry::default(),
            inflight: Arc::default(),
        }
    }

    /// The configuration.
    pub fn configuration(&self) -> &ClientConfiguration {
        &self.configuration
    }

    /// The credential store.
    pub fn store(&self) -> &StoreT {
        &self.store
    }

    /// The cache.
    pub fn cache(&self) -> &CacheT {
        &self.cache
    }

    /// Query.
    ///
    /// Serves a fresh cached result without a network call; otherwise fetches,
    /// coalescing with any in-flight fetch of the same key.
    pub async fn fetch(&self, endpoint: &QueryEndpoint, params: QueryParams) -> QueryResult {
        let key = QueryKey::new(endpoint.name.clone(), params);

        if let Some(entry) = self.cache.get(&key).await
            && entry.is_fresh()
        {
            tracing::debug!("hit: {}", key);
            return Ok(entry.value.clone());
        }

        self.fetch_coalesced(endpoint, key, false).await
    }

    /// Query, bypassing the freshness check.
    ///
    /// Still coalesces with any in-flight fetch of the same key.
    pub async fn refetch(&self, endpoint: &QueryEndpoint, params: QueryParams) -> QueryResult {
        let key = QueryKey::new(endpoint.name.clone(), params);
        self.fetch_coalesced(endpoint, key, true).await
    }

    /// Subscribe to a query.
    ///
    /// Fetches (or serves from cache) first, so the subscription always starts
    /// with a value.
    pub async fn subscribe(
        &self,
        endpoint: &QueryEndpoint,
        params: QueryParams,
    ) -> Result<Subscription, ClientError> {
        let value = self.fetch(endpoint, params.clone()).await?;
        let key = QueryKey::new(endpoint.name.clone(), params);
        Ok(self.registry.subscribe(key, endpoint, value))
    }

    /// Mutate.
    ///
    /// See the type documentation for the optimistic-update and invalidation
    /// flow. Returns the response body on success.
    pub async fn mutate(
        &self,
        endpoint: &MutationEndpoint,
        params: QueryParams,
        payload: Option<Value>,
        optimistic: Option<OptimisticUpdate>,
    ) -> Result<Value, ClientError> {
        let applied = match optimistic {
            Some(update) => self.apply_optimistic(update).await,
            None => None,
        };

        let request = endpoint.request(&params, payload);
        let result = self.service.clone().oneshot(request).await;

        match result {
            Ok(response) if response.is_success() => {
                if let Some(applied) = &applied {
                    tracing::debug!("commit: {}", applied.key);
                }
                self.invalidate(&endpoint.invalidates).await;
                Ok(response.body)
            }

            Ok(response) => {
                if let Some(applied) = applied {
                    self.revert_optimistic(applied).await;
                }
                Err(ClientError::for_response(response))
            }

            Err(error) => {
                if let Some(applied) = applied {
                    self.revert_optimistic(applied).await;
                }
                Err(error)
            }
        }
    }

    /// Invalidate every cache entry carrying any of the tags, then refetch every
    /// subscribed query whose endpoint declares an intersecting tag.
    ///
    /// A failed refetch is logged; its subscribers keep the last published
    /// value.
    pub async fn invalidate(&self, tags: &[Tag]) {
        self.cache.invalidate(tags).await;

        for (endpoint, params) in self.registry.subscribed_to(tags) {
            if let Err(error) = self.refetch(&endpoint, params).await {
                tracing::warn!("refetch after invalidation failed: {}", error);
            }
        }
    }

    /// The window regained focus: refetch subscribed queries that opted in.
    pub async fn notify_focus(&self) {
        self.notify(RefetchTrigger::Focus).await
    }

    /// The network reconnected: refetch subscribed queries that opted in.
    pub async fn notify_reconnect(&self) {
        self.notify(RefetchTrigger::Reconnect).await
    }

    /// Log in.
    ///
    /// On success the credential pair is extracted from the response body
    /// (camelCase `accessToken`/`refreshToken`) and stored; the full body is
    /// returned so the caller keeps the user record.
    pub async fn login(&self, path: &str, payload: Value) -> Result<Value, ClientError> {
        let request = ApiRequest::post(path).with_body(payload);
        let response = self.service.clone().oneshot(request).await?;

        if !response.is_success() {
            return Err(ClientError::for_response(response));
        }

        match Credentials::from_json(&response.body) {
            Some(credentials) => {
                self.store.set(credentials);
                tracing::debug!("logged in");
                Ok(response.body)
            }

            None => Err(ClientError::Decode(
                "login response carries no credential pair".into(),
            )),
        }
    }

    /// Log out.
    ///
    /// The server call, if a path is given, is best-effort (a failure is logged):
    /// local logout always succeeds. Clears the credentials and the entire
    /// cache.
    pub async fn logout(&self, path: Option<&str>) {
        if let Some(path) = path
            && let Err(error) = self.service.clone().oneshot(ApiRequest::post(path)).await
        {
            tracing::warn!("logout request failed: {}", error);
        }

        self.store.clear();
        self.cache.invalidate_all().await;
        tracing::debug!("logged out");
    }

    async fn notify(&self, trigger: RefetchTrigger) {
        for (endpoint, params) in self.registry.refetchable(trigger, &self.configuration) {
            tracing::debug!("{}: refetching {}", trigger, endpoint.name);
            if let Err(error) = self.refetch(&endpoint, params).await {
                tracing::warn!("refetch on {} failed: {}", trigger, error);
            }
        }
    }

    // Coalesced fetch: at most one network call per key at a time
    async fn fetch_coalesced(&self, endpoint: &QueryEndpoint, key: QueryKey, force: bool) -> QueryResult {
        loop {
            let receiver = match self.inflight.entry(key.clone()) {
                Entry::Vacant(vacant) => {
                    let (sender, _receiver) = broadcast::channel(1);
                    vacant.insert(sender);
                    None
                }

                Entry::Occupied(occupied) => Some(occupied.get().subscribe()),
            };

            match receiver {
                // We claimed the slot
                None => break,

                Some(mut receiver) => {
                    tracing::debug!("coalesce: {}", key);
                    match receiver.recv().await {
                        Ok(result) => return result,

                        // The slot holder went away without settling; race for
                        // the slot again
                        Err(_) => continue,
                    }
                }
            }
        }

        let slot = InflightSlot {
            inflight: self.inflight.as_ref(),
            key: &key,
            armed: true,
        };

        // A fetch may have settled between the caller's freshness check and the
        // slot claim
        let result = match self.cache.get(&key).await {
            Some(entry) if !force && entry.is_fresh() => Ok(entry.value.clone()),
            _ => self.fetch_network(endpoint, &key).await,
        };

        slot.settle(result.clone());

        result
    }

    async fn fetch_network(&self, endpoint: &QueryEndpoint, key: &QueryKey) -> QueryResult {
        tracing::debug!("miss: {}", key);

        let request = endpoint.request(&key.params);
        let response = self.service.clone().oneshot(request).await?;

        if !response.is_success() {
            return Err(ClientError::for_response(response));
        }

        let ttl = response
            .cache_ttl()
            .unwrap_or_else(|| endpoint.ttl_or(&self.configuration));

        let value = Arc::new(response.body);
        let entry = Arc::new(CacheEntry::new(
            value.clone(),
            ttl,
            endpoint.retention_or(&self.configuration),
            endpoint.tags.clone(),
        ));

        self.cache.put(key.clone(), entry).await;
        tracing::debug!("store: {}", key);

        self.registry.publish(key, value.clone());

        Ok(value)
    }

    async fn apply_optimistic(&self, update: OptimisticUpdate) -> Option<AppliedPatch> {
        let key = QueryKey::new(update.endpoint, update.params);

        // No cached entry means nothing to patch; the mutation still runs
        let previous = self.cache.get(&key).await?;

        let mut value = previous.value.as_ref().clone();
        (update.patch)(&mut value);
        let value = Arc::new(value);

        let patched = Arc::new(previous.with_value(value.clone()));
        self.cache.put(key.clone(), patched).await;
        self.registry.publish(&key, value);

        tracing::debug!("optimistic: {}", key);
        Some(AppliedPatch { key, previous })
    }

    async fn revert_optimistic(&self, applied: AppliedPatch) {
        tracing::debug!("revert: {}", applied.key);
        self.registry.publish(&applied.key, applied.previous.value.clone());
        self.cache.put(applied.key, applied.previous).await;
    }
}

impl<TransportT, CacheT, StoreT> Clone for QueryClient<TransportT, CacheT, StoreT>
where
    TransportT: Clone,
    CacheT: Clone,
    StoreT: Clone,
{
    fn clone(&self) -> Self {
        Self {
            configuration: self.configuration.clone(),
            service: self.service.clone(),
            store: self.store.clone(),
            cache: self.cache.clone(),
            registry: self.registry.clone(),
            inflight: self.inflight.clone(),
        }
    }
}

//
// InflightSlot
//

// Removes the claimed in-flight slot when the slot holder is cancelled
// mid-fetch, so that waiters re-race instead of waiting forever.
struct InflightSlot<'own> {
    inflight: &'own InflightMap,
    key: &'own QueryKey,
    armed: bool,
}

impl InflightSlot<'_> {
    // Remove the slot and deliver the outcome to every waiter.
    fn settle(mut self, result: QueryResult) {
        self.armed = false;
        if let Some((_, sender)) = self.inflight.remove(self.key) {
            let _ = sender.send(result);
        }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inflight.remove(self.key);
        }
    }
}
