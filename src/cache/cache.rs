use super::{entry::*, key::*, tag::*};

//
// QueryCache
//

/// Query result cache.
///
/// Implementations should ensure that cloning is cheap and clones always refer to
/// the same shared state.
#[allow(async_fn_in_trait)]
pub trait QueryCache
where
    Self: 'static + Clone + Send + Sync,
{
    /// Get an entry from the cache.
    ///
    /// Note that this is an `async` function written in longer form in order to
    /// include the `Send` constraint. Implementations can simply use `async fn get`.
    fn get(&self, key: &QueryKey) -> impl Future<Output = Option<CacheEntryRef>> + Send;

    /// Put an entry in the cache.
    ///
    /// The cache should take into consideration the [CacheEntry::retention]
    /// window.
    ///
    /// Note that this is an `async` function written in longer form in order to
    /// include the `Send` constraint. Implementations can simply use `async fn put`.
    fn put(&self, key: QueryKey, entry: CacheEntryRef) -> impl Future<Output = ()> + Send;

    /// Remove a cache entry.
    ///
    /// Note that this is an `async` function written in longer form in order to
    /// include the `Send` constraint. Implementations can simply use
    /// `async fn remove`.
    fn remove(&self, key: &QueryKey) -> impl Future<Output = ()> + Send;

    /// Invalidate every cache entry carrying any of the tags.
    ///
    /// Note that this is an `async` function written in longer form in order to
    /// include the `Send` constraint. Implementations can simply use
    /// `async fn invalidate`.
    fn invalidate(&self, tags: &[Tag]) -> impl Future<Output = ()> + Send;

    /// Invalidate all cache entries.
    ///
    /// Note that this is an `async` function written in longer form in order to
    /// include the `Send` constraint. Implementations can simply use
    /// `async fn invalidate_all`.
    fn invalidate_all(&self) -> impl Future<Output = ()> + Send;
}
