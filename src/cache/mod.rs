mod cache;
mod entry;
mod key;
mod tag;
mod tiered;
mod weight;

/// Cache implementations.
pub mod implementation;

#[allow(unused_imports)]
pub use {cache::*, entry::*, key::*, tag::*, tiered::*, weight::*};
