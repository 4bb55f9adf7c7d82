use super::super::super::{entry::*, key::*};

use {duration_str::*, moka::*, std::time::*};

//
// CacheEntryExpiry
//

/// Moka [Expiry] for [CacheEntry](super::super::super::CacheEntry).
///
/// Entries live for their retention window, which restarts when a refetch or an
/// optimistic patch replaces the entry.
pub struct CacheEntryExpiry;

impl Expiry<QueryKey, CacheEntryRef> for CacheEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &QueryKey,
        entry: &CacheEntryRef,
        _created_at: Instant,
    ) -> Option<Duration> {
        tracing::debug!("storing with retention: {}", entry.retention.human_format());
        Some(entry.retention)
    }

    fn expire_after_update(
        &self,
        _key: &QueryKey,
        entry: &CacheEntryRef,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.retention)
    }
}
