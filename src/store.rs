//! Storage abstraction for users, admins, and anonymous token usage.
//!
//! - [`QuotaStore`]: the narrow associative interface the guard is written against.
//! - [`InMemoryQuotaStore`]: hash-map backend (in `memory` module).
//! - [`Snapshot`]: flat export of all three maps, plus file helpers in the
//!   `snapshot` module, so state survives restarts.
//!
//! Any backend with near-O(1) keyed lookup satisfies the contract. The guard
//! serializes read-modify-write sequences per key itself, so backends only need
//! each individual call to be atomic.

use crate::identity::CallerIdentity;
use crate::model::User;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod snapshot;
pub use memory::{InMemoryQuotaStore, MemoryStoreError};

/// Flat, serializable copy of every map in a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// `(identity, user)` pairs.
    pub users: Vec<(CallerIdentity, User)>,
    /// Admin identities.
    pub admins: Vec<CallerIdentity>,
    /// `(token, lifetime usage)` pairs.
    pub anonymous_usage: Vec<(String, u32)>,
}

impl Snapshot {
    /// True when the snapshot holds no state at all.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.admins.is_empty() && self.anonymous_usage.is_empty()
    }
}

/// Backing store for guard state.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a user record.
    async fn get_user(&self, id: &CallerIdentity) -> Result<Option<User>, Self::Error>;

    /// Insert or overwrite a user record.
    async fn put_user(&self, id: &CallerIdentity, user: User) -> Result<(), Self::Error>;

    /// Remove a user record, returning it if it existed.
    async fn remove_user(&self, id: &CallerIdentity) -> Result<Option<User>, Self::Error>;

    /// All users, sorted by identity.
    async fn users(&self) -> Result<Vec<(CallerIdentity, User)>, Self::Error>;

    /// Number of stored users.
    async fn user_count(&self) -> Result<usize, Self::Error>;

    /// Admin-set membership.
    async fn is_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error>;

    /// Add to the admin set. Returns `false` if already present.
    async fn add_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error>;

    /// Remove from the admin set. Returns `false` if absent.
    async fn remove_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error>;

    /// All admins, sorted.
    async fn admins(&self) -> Result<Vec<CallerIdentity>, Self::Error>;

    /// Size of the admin set.
    async fn admin_count(&self) -> Result<usize, Self::Error>;

    /// Lifetime usage for an anonymous token (0 if never seen).
    async fn anonymous_usage(&self, token: &str) -> Result<u32, Self::Error>;

    /// Increment a token's usage, creating it at 1. Returns the new count.
    async fn increment_anonymous_usage(&self, token: &str) -> Result<u32, Self::Error>;

    /// Number of tracked anonymous tokens.
    async fn anonymous_token_count(&self) -> Result<usize, Self::Error>;

    /// All `(token, usage)` pairs, sorted by token.
    async fn anonymous_entries(&self) -> Result<Vec<(String, u32)>, Self::Error>;

    /// Export every map as flat lists.
    async fn snapshot(&self) -> Result<Snapshot, Self::Error> {
        Ok(Snapshot {
            users: self.users().await?,
            admins: self.admins().await?,
            anonymous_usage: self.anonymous_entries().await?,
        })
    }

    /// Replace every map with the snapshot's contents.
    async fn restore(&self, snapshot: Snapshot) -> Result<(), Self::Error>;
}
