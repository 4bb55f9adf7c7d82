mod credentials;
mod file;
mod memory;
mod store;

#[allow(unused_imports)]
pub use {credentials::*, file::*, memory::*, store::*};
