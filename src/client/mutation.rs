use super::{
    super::{cache::*, request::*},
    endpoint::*,
};

use {serde_json::Value, std::sync::*};

/// Hook to patch a cached value optimistically.
pub type PatchHook = Arc<Box<dyn Fn(&mut Value) + Send + Sync>>;

//
// OptimisticUpdate
//

/// A provisional, reversible update to one cached query result, applied ahead of
/// server confirmation.
///
/// The undo information (the previous cache entry) is captured at apply time, so
/// concurrent updates to one entry are independent apply/rollback pairs: reverts
/// compose correctly in LIFO order, and an out-of-order revert is
/// last-writer-wins. There is no merge conflict detection; the authoritative
/// refetch after a successful mutation reconciles any drift.
#[derive(Clone)]
pub struct OptimisticUpdate {
    /// Target query endpoint name.
    pub endpoint: Arc<str>,

    /// Target query parameters.
    pub params: QueryParams,

    /// Patch (hook).
    pub patch: PatchHook,
}

impl OptimisticUpdate {
    /// Constructor.
    pub fn new(
        endpoint: &QueryEndpoint,
        params: QueryParams,
        patch: impl Fn(&mut Value) + 'static + Send + Sync,
    ) -> Self {
        Self {
            endpoint: endpoint.name.clone(),
            params,
            patch: Arc::new(Box::new(patch)),
        }
    }
}

//
// AppliedPatch
//

// Undo information for one applied [OptimisticUpdate].
pub(crate) struct AppliedPatch {
    pub key: QueryKey,
    pub previous: CacheEntryRef,
}
