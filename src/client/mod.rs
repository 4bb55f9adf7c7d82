mod client;
mod configuration;
mod endpoint;
mod mutation;
mod subscription;

#[allow(unused_imports)]
pub use {client::*, configuration::*, endpoint::*, mutation::*, subscription::*};
