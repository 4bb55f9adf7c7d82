use super::{super::request::*, weight::*};

use std::{fmt, sync::*};

//
// QueryKey
//

/// Cache key for a query: the endpoint name plus its normalized parameters.
///
/// Parameter normalization lives in [QueryParams] (sorted order), so two queries
/// that differ only in parameter order share one key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueryKey {
    /// Endpoint name.
    pub endpoint: Arc<str>,

    /// Normalized parameters.
    pub params: QueryParams,
}

impl QueryKey {
    /// Constructor.
    pub fn new(endpoint: Arc<str>, params: QueryParams) -> Self {
        Self { endpoint, params }
    }
}

impl CacheWeight for QueryKey {
    fn cache_weight(&self) -> usize {
        const SELF_SIZE: usize = size_of::<QueryKey>();

        let mut size = SELF_SIZE + self.endpoint.len();

        for (key, value) in self.params.iter() {
            size += key.len() + value.len();
        }

        size
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}|{}", self.endpoint, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_order_is_irrelevant() {
        let endpoint: Arc<str> = "salons".into();
        let first = QueryKey::new(
            endpoint.clone(),
            QueryParams::new().with("city", "haifa").with("page", "2"),
        );
        let second = QueryKey::new(
            endpoint,
            QueryParams::new().with("page", "2").with("city", "haifa"),
        );
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "salons|city=haifa&page=2");
    }
}
