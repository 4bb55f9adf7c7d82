use super::credentials::*;

//
// CredentialStore
//

/// Credential store.
///
/// The single source of truth for the current bearer credential pair. No network
/// calls; persistence, if any, is the implementation's business.
///
/// Implementations should ensure that cloning is cheap and clones always refer to
/// the same shared state.
pub trait CredentialStore
where
    Self: 'static + Clone + Send + Sync,
{
    /// Get the current credentials.
    fn get(&self) -> Option<Credentials>;

    /// Atomically overwrite the credentials.
    fn set(&self, credentials: Credentials);

    /// Remove the credentials.
    fn clear(&self);
}
