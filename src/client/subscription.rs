use super::{
    super::{cache::*, request::*},
    configuration::*,
    endpoint::*,
};

use {
    dashmap::DashMap,
    serde_json::Value,
    std::sync::*,
    tokio::sync::watch,
};

//
// SubscriptionRegistry
//

// Live query subscriptions: one watch channel per subscribed cache key, plus the
// endpoint definition needed to refetch it.
//
// Clones share state. The cache can evict a subscribed entry (retention is the
// cache's business); the watch channel keeps the last published value, so
// subscribers never lose their view.
#[derive(Clone, Default)]
pub(crate) struct SubscriptionRegistry {
    entries: Arc<DashMap<QueryKey, SubscribedEntry>>,
}

struct SubscribedEntry {
    sender: watch::Sender<Arc<Value>>,
    subscribers: usize,
    endpoint: QueryEndpoint,
}

impl SubscriptionRegistry {
    pub fn subscribe(&self, key: QueryKey, endpoint: &QueryEndpoint, initial: Arc<Value>) -> Subscription {
        let receiver = {
            let mut entry = self.entries.entry(key.clone()).or_insert_with(|| SubscribedEntry {
                sender: watch::channel(initial).0,
                subscribers: 0,
                endpoint: endpoint.clone(),
            });
            entry.subscribers += 1;
            entry.sender.subscribe()
        };

        tracing::debug!("subscribe: {}", key);
        Subscription {
            key,
            receiver,
            registry: self.clone(),
        }
    }

    fn unsubscribe(&self, key: &QueryKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
        }
        self.entries.remove_if(key, |_, entry| entry.subscribers == 0);
        tracing::debug!("unsubscribe: {}", key);
    }

    pub fn publish(&self, key: &QueryKey, value: Arc<Value>) {
        if let Some(entry) = self.entries.get(key) {
            entry.sender.send_replace(value);
        }
    }

    // Subscribed queries whose endpoint carries any of the tags
    pub fn subscribed_to(&self, tags: &[Tag]) -> Vec<(QueryEndpoint, QueryParams)> {
        self.entries
            .iter()
            .filter(|entry| entry.value().endpoint.tags.iter().any(|tag| tags.contains(tag)))
            .map(|entry| (entry.value().endpoint.clone(), entry.key().params.clone()))
            .collect()
    }

    // Subscribed queries that opted into the trigger
    pub fn refetchable(
        &self,
        trigger: RefetchTrigger,
        configuration: &ClientConfiguration,
    ) -> Vec<(QueryEndpoint, QueryParams)> {
        self.entries
            .iter()
            .filter(|entry| entry.value().endpoint.refetch_on(trigger, configuration))
            .map(|entry| (entry.value().endpoint.clone(), entry.key().params.clone()))
            .collect()
    }
}

//
// Subscription
//

/// A live subscription to one query.
///
/// Every refetch, optimistic patch, and rollback of the subscribed query is
/// published here. Dropping the subscription de-registers it; an in-flight fetch
/// for the query is allowed to complete and its result lands in the cache
/// unobserved.
pub struct Subscription {
    key: QueryKey,
    receiver: watch::Receiver<Arc<Value>>,
    registry: SubscriptionRegistry,
}

impl Subscription {
    /// The subscribed cache key.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The last published value.
    pub fn current(&self) -> Arc<Value> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published value.
    ///
    /// Values published while the caller was not waiting are not replayed; this
    /// always resolves to the *latest* value.
    pub async fn changed(&mut self) -> Arc<Value> {
        // The sender lives in the registry for at least as long as we do, so this
        // can only resolve with a value
        let _ = self.receiver.changed().await;
        self.current()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.key);
    }
}
