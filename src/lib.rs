// https://stackoverflow.com/a/61417700
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod layer;
mod service;

/// Cache.
pub mod cache;

/// Query client.
pub mod client;

/// Credentials.
pub mod credentials;

/// Errors.
pub mod error;

/// Refresh coordination.
pub mod refresh;

/// Requests and responses.
pub mod request;

/// Transport implementations.
pub mod transport;

pub use {layer::*, service::*};
