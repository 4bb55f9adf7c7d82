use super::super::super::{cache::*, entry::*, key::*, tag::*};

use std::{ops::*, sync::*};

//
// MokaQueryCache
//

/// Moka [QueryCache] implementation.
///
/// Retention is enforced per-entry via [CacheEntryExpiry](super::expiry::CacheEntryExpiry),
/// and tag invalidation uses Moka's invalidation closures, so the underlying
/// cache must be built with [ForQueryResults](super::builder::ForQueryResults)
/// (see the demos).
pub type MokaQueryCache = Arc<moka::future::Cache<QueryKey, CacheEntryRef>>;

impl QueryCache for MokaQueryCache {
    async fn get(&self, key: &QueryKey) -> Option<CacheEntryRef> {
        self.deref().get(key).await
    }

    async fn put(&self, key: QueryKey, entry: CacheEntryRef) {
        self.deref().insert(key, entry).await
    }

    async fn remove(&self, key: &QueryKey) {
        self.deref().invalidate(key).await
    }

    async fn invalidate(&self, tags: &[Tag]) {
        let tags = tags.to_vec();
        if let Err(error) = self
            .deref()
            .invalidate_entries_if(move |_key, entry| entry.tagged_any(&tags))
        {
            // Only possible if the cache was built without invalidation closure
            // support
            tracing::error!("invalidate: {}", error);
        }
    }

    async fn invalidate_all(&self) {
        self.deref().invalidate_all()
    }
}
