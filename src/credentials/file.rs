use super::{credentials::*, memory::*, store::*};

use std::{fs, io, path::*, sync::*};

//
// JsonFileCredentialStore
//

/// [CredentialStore] persisted as a JSON file.
///
/// The file is read once at construction; afterwards the in-memory copy is
/// authoritative and the file is rewritten on every [set](CredentialStore::set)
/// and removed on [clear](CredentialStore::clear).
///
/// Storage failures degrade the store to in-memory-only for this process-life:
/// they are logged and never surfaced to callers, because a session that cannot
/// be persisted is still a session.
#[derive(Clone, Debug)]
pub struct JsonFileCredentialStore {
    path: Arc<PathBuf>,
    memory: MemoryCredentialStore,
}

impl JsonFileCredentialStore {
    /// Constructor.
    ///
    /// A missing file means no session; an unreadable or unparseable file is
    /// treated the same way (and logged).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let memory = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Credentials>(&bytes) {
                Ok(credentials) => MemoryCredentialStore::new_with(credentials),

                Err(error) => {
                    tracing::warn!("ignoring unparseable credential file: {}", error);
                    MemoryCredentialStore::new()
                }
            },

            Err(error) => {
                if error.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("ignoring unreadable credential file: {}", error);
                }
                MemoryCredentialStore::new()
            }
        };

        Self {
            path: Arc::new(path),
            memory,
        }
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn get(&self) -> Option<Credentials> {
        self.memory.get()
    }

    fn set(&self, credentials: Credentials) {
        self.memory.set(credentials.clone());

        match serde_json::to_vec_pretty(&credentials) {
            Ok(bytes) => {
                if let Err(error) = fs::write(self.path.as_ref(), bytes) {
                    tracing::warn!("could not persist credentials: {}", error);
                }
            }

            Err(error) => tracing::warn!("could not serialize credentials: {}", error),
        }
    }

    fn clear(&self) {
        self.memory.clear();

        if let Err(error) = fs::remove_file(self.path.as_ref())
            && error.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!("could not remove credential file: {}", error);
        }
    }
}
