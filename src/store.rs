use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::user::UserCredential;

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

/// CAS token for optimistic-concurrency writes. a missing record is
/// version 0; every successful write bumps the version by one.
pub type Version = u64;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential record version conflict")]
    Conflict,

    #[error("credential store unavailable")]
    Unavailable(#[source] BoxDynError),
}

#[derive(Debug, Clone)]
pub struct VersionedUser {
    pub version: Version,
    pub user: UserCredential,
}

/// the narrow interface the engine requires of durable credential
/// storage. a missing record is `Ok(None)`; `put` succeeds only when
/// `expected` matches the stored version, so a read-modify-write keyed on
/// the version it read is serialized per record.
pub trait CredentialStore: Send + Sync {
    fn get(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<VersionedUser>, StoreError>> + Send;

    fn put(
        &self,
        username: &str,
        user: UserCredential,
        expected: Version,
    ) -> impl Future<Output = Result<Version, StoreError>> + Send;
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore
{
    async fn get(&self, username: &str) -> Result<Option<VersionedUser>, StoreError> {
        self.as_ref().get(username).await
    }

    async fn put(
        &self,
        username: &str,
        user: UserCredential,
        expected: Version,
    ) -> Result<Version, StoreError> {
        self.as_ref().put(username, user, expected).await
    }
}

/// in-memory reference store. the entry api keeps the compare-and-swap in
/// `put` atomic per record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, VersionedUser>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            records: DashMap::new(),
        }
    }

    /// seeds a record at version 1, replacing any existing entry. intended
    /// for provisioning and test setup, not for the verify paths.
    pub fn create(&self, user: UserCredential) {
        self.records.insert(user.username.clone(), VersionedUser {
            version: 1,
            user,
        });
    }
}

impl CredentialStore for MemoryStore {
    async fn get(&self, username: &str) -> Result<Option<VersionedUser>, StoreError> {
        Ok(self.records.get(username).map(|found| found.value().clone()))
    }

    async fn put(
        &self,
        username: &str,
        user: UserCredential,
        expected: Version,
    ) -> Result<Version, StoreError> {
        match self.records.entry(username.into()) {
            Entry::Occupied(mut found) => {
                if found.get().version != expected {
                    return Err(StoreError::Conflict);
                }

                let next = expected + 1;

                found.insert(VersionedUser {
                    version: next,
                    user,
                });

                Ok(next)
            },
            Entry::Vacant(empty) => {
                if expected != 0 {
                    return Err(StoreError::Conflict);
                }

                empty.insert(VersionedUser {
                    version: 1,
                    user,
                });

                Ok(1)
            }
        }
    }
}
