use super::request::*;

use {http::StatusCode, serde_json::Value, thiserror::Error};

//
// TransportError
//

/// Transport-level failure: no usable response reached the caller.
///
/// These are [Clone] because coalesced callers of one fetch all receive the same
/// outcome (see [QueryClient](super::client::QueryClient)).
#[derive(Clone, Debug, Error)]
pub enum TransportError {
    /// Could not connect (DNS, refused, reset).
    #[error("connect: {0}")]
    Connect(String),

    /// The transport's timeout elapsed.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The response body could not be read or decoded as JSON.
    #[error("body: {0}")]
    Body(String),
}

//
// ClientError
//

/// Client error.
///
/// The taxonomy callers dispatch on:
///
/// * [Network](ClientError::Network): nothing usable came back; show a retry
///   affordance. This layer does not retry network failures.
/// * [Unauthenticated](ClientError::Unauthenticated): the session cannot be
///   re-established (refresh token rejected, or a retried request was rejected
///   again); the caller must redirect to login.
/// * [Status](ClientError::Status): the backend answered with a non-success
///   status; the payload is passed through verbatim for field-level display.
/// * [Decode](ClientError::Decode): a success response whose body does not have
///   the required shape.
#[derive(Clone, Debug, Error)]
pub enum ClientError {
    /// Network-level failure.
    #[error("network: {0}")]
    Network(#[from] TransportError),

    /// Terminal authorization failure.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Non-success response, passed through unmodified.
    #[error("status: {status}")]
    Status {
        /// Status code.
        status: StatusCode,

        /// Response body.
        data: Value,
    },

    /// A success response with an unusable body.
    #[error("decode: {0}")]
    Decode(String),
}

impl ClientError {
    /// Construct a [Status](ClientError::Status) error from a non-success response.
    pub fn for_response(response: ApiResponse) -> Self {
        Self::Status {
            status: response.status,
            data: response.body,
        }
    }
}
