use super::super::{error::*, request::*};

use {
    serde_json::Value,
    std::{pin::*, sync::*, task::*},
    tower::Service,
};

//
// ReqwestTransport
//

/// HTTP transport based on [reqwest](https://github.com/seanmonstar/reqwest).
///
/// One transport per backend: the base URL is prepended to every request path.
/// Timeouts, connection pooling, and proxies are all the
/// [Client](::reqwest::Client)'s business; construct one to your preferences and
/// pass it to [new_with](Self::new_with).
///
/// Cloning is cheap and clones share the underlying client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ::reqwest::Client,
    base_url: Arc<str>,
}

impl ReqwestTransport {
    /// Constructor with a default client.
    pub fn new(base_url: impl Into<Arc<str>>) -> Self {
        Self::new_with(::reqwest::Client::new(), base_url)
    }

    /// Constructor.
    pub fn new_with(client: ::reqwest::Client, base_url: impl Into<Arc<str>>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Service<ApiRequest> for ReqwestTransport {
    type Response = ApiResponse;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send>>;

    fn poll_ready(&mut self, _context: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let client = self.client.clone();
        let url = format!("{}{}", self.base_url, request.path);

        Box::pin(async move {
            let mut builder = client.request(request.method, url);

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }

            for (name, value) in &request.headers {
                builder = builder.header(name, value.clone());
            }

            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(for_send_error)?;

            let status = response.status();
            let headers = response.headers().clone();

            let bytes = response
                .bytes()
                .await
                .map_err(|error| TransportError::Body(error.to_string()))?;

            // An empty body is common for 204 and for error statuses
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes)
                    .map_err(|error| TransportError::Body(error.to_string()))?
            };

            Ok(ApiResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn for_send_error(error: ::reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else {
        TransportError::Connect(error.to_string())
    }
}
