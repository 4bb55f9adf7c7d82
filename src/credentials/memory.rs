use super::{credentials::*, store::*};

use std::sync::*;

//
// MemoryCredentialStore
//

/// In-memory [CredentialStore].
///
/// Clones share state. Suitable for tests and for sessions that should not
/// survive the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Arc<RwLock<Option<Credentials>>>,
}

impl MemoryCredentialStore {
    /// Constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructor with initial credentials.
    pub fn new_with(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(RwLock::new(Some(credentials))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credentials> {
        self.credentials.read().expect("credentials lock").clone()
    }

    fn set(&self, credentials: Credentials) {
        *self.credentials.write().expect("credentials lock") = Some(credentials);
    }

    fn clear(&self) {
        *self.credentials.write().expect("credentials lock") = None;
    }
}
