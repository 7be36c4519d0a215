use super::{QuotaStore, Snapshot};
use crate::identity::CallerIdentity;
use crate::model::User;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Errors from the in-memory store.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// A writer panicked while holding the lock.
    #[error("in-memory quota store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<CallerIdentity, User>,
    admins: HashSet<CallerIdentity>,
    anonymous: HashMap<String, u32>,
}

/// Hash-map backed store. Clones share state.
#[derive(Default, Clone, Debug)]
pub struct InMemoryQuotaStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, MemoryStoreError> {
        self.tables.lock().map_err(|_| MemoryStoreError::Poisoned)
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    type Error = MemoryStoreError;

    async fn get_user(&self, id: &CallerIdentity) -> Result<Option<User>, Self::Error> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    async fn put_user(&self, id: &CallerIdentity, user: User) -> Result<(), Self::Error> {
        self.tables()?.users.insert(id.clone(), user);
        Ok(())
    }

    async fn remove_user(&self, id: &CallerIdentity) -> Result<Option<User>, Self::Error> {
        Ok(self.tables()?.users.remove(id))
    }

    async fn users(&self) -> Result<Vec<(CallerIdentity, User)>, Self::Error> {
        let guard = self.tables()?;
        let mut users: Vec<_> =
            guard.users.iter().map(|(id, user)| (id.clone(), user.clone())).collect();
        users.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(users)
    }

    async fn user_count(&self) -> Result<usize, Self::Error> {
        Ok(self.tables()?.users.len())
    }

    async fn is_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error> {
        Ok(self.tables()?.admins.contains(id))
    }

    async fn add_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error> {
        Ok(self.tables()?.admins.insert(id.clone()))
    }

    async fn remove_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error> {
        Ok(self.tables()?.admins.remove(id))
    }

    async fn admins(&self) -> Result<Vec<CallerIdentity>, Self::Error> {
        let mut admins: Vec<_> = self.tables()?.admins.iter().cloned().collect();
        admins.sort();
        Ok(admins)
    }

    async fn admin_count(&self) -> Result<usize, Self::Error> {
        Ok(self.tables()?.admins.len())
    }

    async fn anonymous_usage(&self, token: &str) -> Result<u32, Self::Error> {
        Ok(self.tables()?.anonymous.get(token).copied().unwrap_or(0))
    }

    async fn increment_anonymous_usage(&self, token: &str) -> Result<u32, Self::Error> {
        let mut guard = self.tables()?;
        let count = guard.anonymous.entry(token.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    async fn anonymous_token_count(&self) -> Result<usize, Self::Error> {
        Ok(self.tables()?.anonymous.len())
    }

    async fn anonymous_entries(&self) -> Result<Vec<(String, u32)>, Self::Error> {
        let guard = self.tables()?;
        let mut entries: Vec<_> = guard.anonymous.iter().map(|(t, c)| (t.clone(), *c)).collect();
        entries.sort();
        Ok(entries)
    }

    async fn restore(&self, snapshot: Snapshot) -> Result<(), Self::Error> {
        let mut guard = self.tables()?;
        guard.users = snapshot.users.into_iter().collect();
        guard.admins = snapshot.admins.into_iter().collect();
        guard.anonymous = snapshot.anonymous_usage.into_iter().collect();
        Ok(())
    }
}
