use super::{cache::*, entry::*, key::*, tag::*};

//
// TieredCache
//

/// Two-tiered [QueryCache].
///
/// The assumption is that the first cache is faster than the next.
///
/// For more tiers you can chain this type.
#[derive(Clone, Debug)]
pub struct TieredCache<FirstCacheT, NextCacheT> {
    /// First cache.
    pub first: FirstCacheT,

    /// Next cache.
    pub next: NextCacheT,
}

impl<FirstCacheT, NextCacheT> TieredCache<FirstCacheT, NextCacheT> {
    /// Constructor.
    pub fn new(first: FirstCacheT, next: NextCacheT) -> Self {
        Self { first, next }
    }
}

impl<FirstCacheT, NextCacheT> QueryCache for TieredCache<FirstCacheT, NextCacheT>
where
    FirstCacheT: QueryCache,
    NextCacheT: QueryCache,
{
    async fn get(&self, key: &QueryKey) -> Option<CacheEntryRef> {
        match self.first.get(key).await {
            Some(entry) => Some(entry),
            None => self.next.get(key).await,
        }
    }

    async fn put(&self, key: QueryKey, entry: CacheEntryRef) {
        self.first.put(key.clone(), entry.clone()).await;
        self.next.put(key, entry).await
    }

    async fn remove(&self, key: &QueryKey) {
        self.first.remove(key).await;
        self.next.remove(key).await
    }

    async fn invalidate(&self, tags: &[Tag]) {
        self.first.invalidate(tags).await;
        self.next.invalidate(tags).await
    }

    async fn invalidate_all(&self) {
        self.first.invalidate_all().await;
        self.next.invalidate_all().await
    }
}
