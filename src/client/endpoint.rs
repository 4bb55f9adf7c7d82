use super::{
    super::{cache::*, request::*},
    configuration::*,
};

use {
    http::Method,
    serde_json::Value,
    std::{fmt, sync::*, time::*},
};

//
// QueryEndpoint
//

/// Definition of a read endpoint.
///
/// One definition per endpoint, shared by every call site, so that TTL,
/// retention, tags, and refetch triggers are declared exactly once; the tag
/// graph is only as correct as its single declaration site.
///
/// The path may carry `{param}` placeholders; parameters consumed by the path do
/// not repeat in the query string.
#[derive(Clone, Debug)]
pub struct QueryEndpoint {
    /// Endpoint name (the cache key namespace).
    pub name: Arc<str>,

    /// Method.
    ///
    /// GET by default.
    pub method: Method,

    /// Path, optionally with `{param}` placeholders.
    pub path: Arc<str>,

    /// Freshness window override.
    pub ttl: Option<Duration>,

    /// Retention window override.
    pub retention: Option<Duration>,

    /// Tags attached to cached results.
    pub tags: Vec<Tag>,

    /// Refetch-on-focus override.
    pub refetch_on_focus: Option<bool>,

    /// Refetch-on-reconnect override.
    pub refetch_on_reconnect: Option<bool>,
}

impl QueryEndpoint {
    /// Constructor.
    pub fn new(name: impl Into<Arc<str>>, path: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            method: Method::GET,
            path: path.into(),
            ttl: None,
            retention: None,
            tags: Vec::default(),
            refetch_on_focus: None,
            refetch_on_reconnect: None,
        }
    }

    /// Set the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the freshness window.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the retention window.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Attach a tag to cached results.
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set whether subscriptions to this endpoint refetch on focus.
    pub fn refetch_on_focus(mut self, refetch_on_focus: bool) -> Self {
        self.refetch_on_focus = Some(refetch_on_focus);
        self
    }

    /// Set whether subscriptions to this endpoint refetch on reconnect.
    pub fn refetch_on_reconnect(mut self, refetch_on_reconnect: bool) -> Self {
        self.refetch_on_reconnect = Some(refetch_on_reconnect);
        self
    }

    /// Build a request for this endpoint.
    pub fn request(&self, params: &QueryParams) -> ApiRequest {
        let (path, query) = templated(&self.path, params);
        ApiRequest::new(self.method.clone(), path).with_query(query)
    }

    /// The effective freshness window.
    pub fn ttl_or(&self, configuration: &ClientConfiguration) -> Duration {
        self.ttl.unwrap_or(configuration.default_ttl)
    }

    /// The effective retention window.
    pub fn retention_or(&self, configuration: &ClientConfiguration) -> Duration {
        self.retention.unwrap_or(configuration.default_retention)
    }

    /// Whether this endpoint refetches on the trigger.
    pub fn refetch_on(&self, trigger: RefetchTrigger, configuration: &ClientConfiguration) -> bool {
        match trigger {
            RefetchTrigger::Focus => self.refetch_on_focus.unwrap_or(configuration.refetch_on_focus),
            RefetchTrigger::Reconnect => self
                .refetch_on_reconnect
                .unwrap_or(configuration.refetch_on_reconnect),
        }
    }
}

//
// MutationEndpoint
//

/// Definition of a write endpoint.
///
/// The declared [invalidates](MutationEndpoint::invalidates) set must cover every
/// query endpoint whose results this mutation can affect.
#[derive(Clone, Debug)]
pub struct MutationEndpoint {
    /// Endpoint name.
    pub name: Arc<str>,

    /// Method.
    ///
    /// POST by default.
    pub method: Method,

    /// Path, optionally with `{param}` placeholders.
    pub path: Arc<str>,

    /// Tags invalidated by a successful mutation.
    pub invalidates: Vec<Tag>,
}

impl MutationEndpoint {
    /// Constructor.
    pub fn new(name: impl Into<Arc<str>>, path: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            method: Method::POST,
            path: path.into(),
            invalidates: Vec::default(),
        }
    }

    /// Set the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Declare a tag invalidated by this mutation.
    pub fn invalidates(mut self, tag: impl Into<Tag>) -> Self {
        self.invalidates.push(tag.into());
        self
    }

    /// Build a request for this endpoint.
    pub fn request(&self, params: &QueryParams, payload: Option<Value>) -> ApiRequest {
        let (path, query) = templated(&self.path, params);
        let mut request = ApiRequest::new(self.method.clone(), path).with_query(query);
        if let Some(payload) = payload {
            request = request.with_body(payload);
        }
        request
    }
}

//
// RefetchTrigger
//

/// Refetch trigger beyond TTL expiry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefetchTrigger {
    /// The window regained focus.
    Focus,

    /// The network reconnected.
    Reconnect,
}

impl fmt::Display for RefetchTrigger {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Focus => fmt::Display::fmt("focus", formatter),
            Self::Reconnect => fmt::Display::fmt("reconnect", formatter),
        }
    }
}

// Substitute `{param}` placeholders; unconsumed parameters become the query
fn templated(path: &str, params: &QueryParams) -> (String, QueryParams) {
    let mut path = path.to_string();
    let mut query = QueryParams::new();

    for (key, value) in params.iter() {
        let placeholder = format!("{{{}}}", key);
        if path.contains(&placeholder) {
            path = path.replace(&placeholder, value);
        } else {
            query = query.with(key, value);
        }
    }

    (path, query)
}
