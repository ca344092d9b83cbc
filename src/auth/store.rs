//! Credential storage.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// A registered user. Never serialised with its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub disabled: bool,
}

/// Keyed user storage behind the authenticator.
pub trait CredentialStore: Send + Sync {
    /// Insert a record unless the username is taken. Returns false when taken.
    fn insert(&self, record: UserRecord) -> bool;

    /// Look up a record by username.
    fn get(&self, username: &str) -> Option<UserRecord>;

    /// Number of stored users.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn insert(&self, record: UserRecord) -> bool {
        let mut users = self.users.write();
        if users.contains_key(&record.username) {
            return false;
        }
        users.insert(record.username.clone(), record);
        true
    }

    fn get(&self, username: &str) -> Option<UserRecord> {
        self.users.read().get(username).cloned()
    }

    fn len(&self) -> usize {
        self.users.read().len()
    }
}
