use super::{tag::*, weight::*};

use {
    serde_json::Value,
    std::{
        sync::*,
        time::{Duration, Instant},
    },
};

/// Common reference type for [CacheEntry].
pub type CacheEntryRef = Arc<CacheEntry>;

//
// CacheEntry
//

/// Cached query result.
///
/// Freshness (TTL) and retention are distinct windows measured from
/// [fetched_at](CacheEntry::fetched_at): a fresh entry is served without a network
/// call, a stale-but-retained entry stays around so that a refetch can publish
/// through existing subscriptions and so that rapid re-navigation stays cheap.
/// Enforcing retention is the cache implementation's job (see
/// [CacheEntryExpiry](super::implementation::moka::CacheEntryExpiry)).
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Value.
    pub value: Arc<Value>,

    /// When the value was fetched.
    pub fetched_at: Instant,

    /// Freshness window.
    pub ttl: Duration,

    /// Retention window.
    pub retention: Duration,

    /// Tags.
    pub tags: Vec<Tag>,
}

impl CacheEntry {
    /// Constructor.
    ///
    /// The retention window is clamped to be at least the TTL, otherwise an entry
    /// could be evicted while still fresh.
    pub fn new(value: Arc<Value>, ttl: Duration, retention: Duration, tags: Vec<Tag>) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            ttl,
            retention: retention.max(ttl),
            tags,
        }
    }

    /// True if the entry is within its freshness window.
    pub fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }

    /// True if the entry carries any of the tags.
    pub fn tagged_any(&self, tags: &[Tag]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }

    /// Clone with a new value, keeping [fetched_at](CacheEntry::fetched_at) and the
    /// windows.
    ///
    /// Used for optimistic patches, which are provisional and must not extend the
    /// entry's freshness.
    pub fn with_value(&self, value: Arc<Value>) -> Self {
        Self {
            value,
            fetched_at: self.fetched_at,
            ttl: self.ttl,
            retention: self.retention,
            tags: self.tags.clone(),
        }
    }
}

impl CacheWeight for CacheEntry {
    fn cache_weight(&self) -> usize {
        const SELF_SIZE: usize = size_of::<CacheEntry>();

        let mut size = SELF_SIZE + self.value.cache_weight();

        for tag in &self.tags {
            size += tag.as_str().len();
        }

        size
    }
}
