use super::{
    super::super::{entry::*, key::*},
    expiry::*,
    weigher::*,
};

//
// ForQueryResults
//

/// Add support for [CacheEntry](super::super::super::CacheEntry) weigher,
/// [Expiry](moka::Expiry), and tag invalidation closures.
pub trait ForQueryResults
where
    Self: Sized,
{
    /// Add support for [CacheEntry](super::super::super::CacheEntry) weigher,
    /// [Expiry](moka::Expiry), and tag invalidation closures.
    fn for_query_results(self) -> Self;
}

impl ForQueryResults
    for moka::future::CacheBuilder<QueryKey, CacheEntryRef, moka::future::Cache<QueryKey, CacheEntryRef>>
{
    fn for_query_results(self) -> Self {
        self.weigher(weigher)
            .expire_after(CacheEntryExpiry)
            .support_invalidation_closures()
    }
}
