use super::super::super::{entry::*, key::*, weight::*};

/// Moka cache entry weigher.
pub fn weigher(key: &QueryKey, entry: &CacheEntryRef) -> u32 {
    let weight = key.cache_weight() + entry.cache_weight();
    let weight = weight.try_into().unwrap_or(u32::MAX);
    tracing::debug!("{} for {}", weight, key);
    weight
}
