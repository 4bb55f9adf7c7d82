use {
    http::{header::*, *},
    serde::*,
    serde_json::Value,
    std::{collections::*, fmt, time::*},
};

/// Custom response header for a server-driven cache TTL.
///
/// Its string value is parsed using [duration-str](https://github.com/baoyachi/duration-str)
/// and overrides the query endpoint's configured TTL.
pub const XX_CACHE_TTL: &str = "xx-cache-ttl";

//
// QueryParams
//

/// Normalized query parameters.
///
/// Backed by a [BTreeMap], so parameter order never matters: `?x=1&y=2` and
/// `?y=2&x=1` normalize to the same value (and thus to the same cache key).
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in normalized (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                write!(formatter, "&")?;
            }
            write!(formatter, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

//
// ApiRequest
//

/// One request to the backend: method, path, query, headers, and an optional
/// JSON body.
///
/// Requests are [Clone] so that the authenticated pipeline can retry the
/// original request after a credential refresh.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    /// Method.
    pub method: Method,

    /// Path (absolute, no query string).
    pub path: String,

    /// Query parameters.
    pub query: QueryParams,

    /// Headers.
    pub headers: HeaderMap,

    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Constructor.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::default(),
            headers: HeaderMap::default(),
            body: None,
        }
    }

    /// Constructor for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Constructor for a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Set the query parameters.
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the bearer `Authorization` header, replacing any previous one.
    pub fn with_bearer(mut self, access_token: &str) -> Self {
        match HeaderValue::try_from(format!("Bearer {}", access_token)) {
            Ok(value) => {
                self.headers.insert(AUTHORIZATION, value);
            }

            // An unencodable token could never authorize anyway; the request will
            // surface the backend's 401
            Err(_) => tracing::warn!("bearer token is not a valid header value"),
        }
        self
    }

    /// The bearer token currently attached, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        if self.query.is_empty() {
            write!(formatter, "{} {}", self.method, self.path)
        } else {
            write!(formatter, "{} {}?{}", self.method, self.path, self.query)
        }
    }
}

//
// ApiResponse
//

/// One response from the backend: status, headers, and the decoded JSON body.
///
/// An empty body decodes to [Value::Null].
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// Status code.
    pub status: StatusCode,

    /// Headers.
    pub headers: HeaderMap,

    /// JSON body.
    pub body: Value,
}

impl ApiResponse {
    /// Constructor.
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::default(),
            body,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Extract the server-driven cache TTL from the [XX_CACHE_TTL] header, if
    /// present and parseable.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.headers
            .get(XX_CACHE_TTL)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| duration_str::parse(value).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_normalize() {
        let forward = QueryParams::new().with("x", "1").with("y", "2");
        let backward = QueryParams::new().with("y", "2").with("x", "1");
        assert_eq!(forward, backward);
        assert_eq!(forward.to_string(), "x=1&y=2");
    }

    #[test]
    fn bearer_round_trip() {
        let request = ApiRequest::get("/cart").with_bearer("token-1");
        assert_eq!(request.bearer(), Some("token-1"));

        let request = request.with_bearer("token-2");
        assert_eq!(request.bearer(), Some("token-2"));
    }

    #[test]
    fn server_driven_ttl() {
        let response = ApiResponse::new(StatusCode::OK, Value::Null)
            .with_header(HeaderName::from_static(XX_CACHE_TTL), HeaderValue::from_static("30s"));
        assert_eq!(response.cache_ttl(), Some(Duration::from_secs(30)));
    }
}
