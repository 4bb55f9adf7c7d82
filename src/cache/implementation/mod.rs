/// Moka cache implementation.
pub mod moka;
