use std::{sync::*, time::*};

//
// ClientConfiguration
//

/// Client configuration.
///
/// Per-endpoint settings on [QueryEndpoint](super::QueryEndpoint) override these
/// defaults.
#[derive(Clone, Debug)]
pub struct ClientConfiguration {
    /// Refresh endpoint path.
    ///
    /// The default is `/auth/refresh`.
    pub refresh_path: Arc<str>,

    /// Default freshness window for query results.
    ///
    /// The default is 60 seconds.
    pub default_ttl: Duration,

    /// Default retention window for query results.
    ///
    /// The default is 60 seconds.
    pub default_retention: Duration,

    /// Whether subscribed queries refetch when the window regains focus.
    ///
    /// The default is false.
    pub refetch_on_focus: bool,

    /// Whether subscribed queries refetch when the network reconnects.
    ///
    /// The default is false.
    pub refetch_on_reconnect: bool,
}

impl ClientConfiguration {
    /// Set the refresh endpoint path.
    pub fn refresh_path(mut self, refresh_path: impl Into<Arc<str>>) -> Self {
        self.refresh_path = refresh_path.into();
        self
    }

    /// Set the default freshness window.
    pub fn default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Set the default retention window.
    pub fn default_retention(mut self, default_retention: Duration) -> Self {
        self.default_retention = default_retention;
        self
    }

    /// Set whether subscribed queries refetch on focus by default.
    pub fn refetch_on_focus(mut self, refetch_on_focus: bool) -> Self {
        self.refetch_on_focus = refetch_on_focus;
        self
    }

    /// Set whether subscribed queries refetch on reconnect by default.
    pub fn refetch_on_reconnect(mut self, refetch_on_reconnect: bool) -> Self {
        self.refetch_on_reconnect = refetch_on_reconnect;
        self
    }
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            refresh_path: "/auth/refresh".into(),
            default_ttl: Duration::from_secs(60),
            default_retention: Duration::from_secs(60),
            refetch_on_focus: false,
            refetch_on_reconnect: false,
        }
    }
}
