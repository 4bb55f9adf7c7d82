//! The transport contract is any [Service](tower::Service)\<[ApiRequest](super::request::ApiRequest)\>
//! returning [ApiResponse](super::request::ApiResponse) or
//! [TransportError](super::error::TransportError): one network call in, one
//! response out, no retries.

#[cfg(feature = "reqwest")]
mod reqwest;

#[cfg(feature = "reqwest")]
#[allow(unused_imports)]
pub use self::reqwest::*;
