use crate::timestamp::Timestamp;
use dashmap::DashMap;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("revocation store unavailable: {0}")]
    Backend(String),
}

/// Last issuance instant per principal. Writes overwrite.
pub trait RevocationStore: Send + Sync {
    fn get(&self, principal_id: i64) -> Result<Option<Timestamp>, StoreError>;
    fn set(&self, principal_id: i64, issued_at: Timestamp) -> Result<(), StoreError>;
}

/// Process-local store. Entries are lost on restart, which invalidates
/// every outstanding token.
#[derive(Default, Debug)]
pub struct MemoryRevocationStore {
    entries: DashMap<i64, Timestamp>,
}

impl MemoryRevocationStore {
    pub fn new() -> MemoryRevocationStore {
        MemoryRevocationStore::default()
    }
}

impl RevocationStore for MemoryRevocationStore {
    fn get(&self, principal_id: i64) -> Result<Option<Timestamp>, StoreError> {
        Ok(self.entries.get(&principal_id).map(|entry| *entry))
    }

    fn set(&self, principal_id: i64, issued_at: Timestamp) -> Result<(), StoreError> {
        self.entries.insert(principal_id, issued_at);
        Ok(())
    }
}
