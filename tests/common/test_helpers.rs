#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tierguard::{
    CallerIdentity, InMemoryQuotaStore, ManualClock, MemorySink, QuotaGuard, QuotaStore, Snapshot,
    User,
};

/// 2023-11-14T22:13:20Z
pub const T0: u64 = 1_700_000_000_000;
pub const MINUTE_MS: u64 = 60 * 1000;
pub const HOUR_MS: u64 = 60 * MINUTE_MS;

pub fn guard_at(
    start: u64,
) -> (QuotaGuard<InMemoryQuotaStore, MemorySink>, ManualClock, MemorySink) {
    let clock = ManualClock::new(start);
    let sink = MemorySink::new();
    let guard = QuotaGuard::new(InMemoryQuotaStore::new())
        .with_clock(clock.clone())
        .with_sink(sink.clone());
    (guard, clock, sink)
}

#[derive(thiserror::Error, Debug)]
#[error("injected write failure")]
pub struct InjectedFailure;

/// In-memory store whose writes can be made to fail on demand.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryQuotaStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), InjectedFailure> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(InjectedFailure)
        } else {
            Ok(())
        }
    }
}

fn never(err: tierguard::MemoryStoreError) -> InjectedFailure {
    panic!("in-memory store failed: {err}")
}

#[async_trait]
impl QuotaStore for FlakyStore {
    type Error = InjectedFailure;

    async fn get_user(&self, id: &CallerIdentity) -> Result<Option<User>, Self::Error> {
        self.inner.get_user(id).await.map_err(never)
    }

    async fn put_user(&self, id: &CallerIdentity, user: User) -> Result<(), Self::Error> {
        self.check()?;
        self.inner.put_user(id, user).await.map_err(never)
    }

    async fn remove_user(&self, id: &CallerIdentity) -> Result<Option<User>, Self::Error> {
        self.check()?;
        self.inner.remove_user(id).await.map_err(never)
    }

    async fn users(&self) -> Result<Vec<(CallerIdentity, User)>, Self::Error> {
        self.inner.users().await.map_err(never)
    }

    async fn user_count(&self) -> Result<usize, Self::Error> {
        self.inner.user_count().await.map_err(never)
    }

    async fn is_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error> {
        self.inner.is_admin(id).await.map_err(never)
    }

    async fn add_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error> {
        self.check()?;
        self.inner.add_admin(id).await.map_err(never)
    }

    async fn remove_admin(&self, id: &CallerIdentity) -> Result<bool, Self::Error> {
        self.check()?;
        self.inner.remove_admin(id).await.map_err(never)
    }

    async fn admins(&self) -> Result<Vec<CallerIdentity>, Self::Error> {
        self.inner.admins().await.map_err(never)
    }

    async fn admin_count(&self) -> Result<usize, Self::Error> {
        self.inner.admin_count().await.map_err(never)
    }

    async fn anonymous_usage(&self, token: &str) -> Result<u32, Self::Error> {
        self.inner.anonymous_usage(token).await.map_err(never)
    }

    async fn increment_anonymous_usage(&self, token: &str) -> Result<u32, Self::Error> {
        self.check()?;
        self.inner.increment_anonymous_usage(token).await.map_err(never)
    }

    async fn anonymous_token_count(&self) -> Result<usize, Self::Error> {
        self.inner.anonymous_token_count().await.map_err(never)
    }

    async fn anonymous_entries(&self) -> Result<Vec<(String, u32)>, Self::Error> {
        self.inner.anonymous_entries().await.map_err(never)
    }

    async fn restore(&self, snapshot: Snapshot) -> Result<(), Self::Error> {
        self.check()?;
        self.inner.restore(snapshot).await.map_err(never)
    }
}
