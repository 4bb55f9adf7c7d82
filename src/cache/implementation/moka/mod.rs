mod builder;
mod cache;
mod expiry;
mod weigher;

#[allow(unused_imports)]
pub use {builder::*, cache::*, expiry::*, weigher::*};
