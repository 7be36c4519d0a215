//! The quota guard: one explicit state container for every operation.
//!
//! [`QuotaGuard`] owns the store handle, clock, telemetry sink, and per-key
//! locks. Its operations are split by concern across modules:
//!
//! - `directory`: login, register, profile, quota status, tier upgrades
//! - `anonymous`: lifetime-capped token usage
//! - `authorize`: the per-request consume decision (`api_call_with_token`)
//! - `admin`: admin-set membership and enumeration
//!
//! State is rehydrated from a [`Snapshot`] before the guard is handed out
//! ([`QuotaGuard::open`]) and exported again on [`QuotaGuard::shutdown`].
//!
//! # Example
//!
//! ```rust
//! use tierguard::{CallerIdentity, InMemoryQuotaStore, QuotaGuard};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tierguard::QuotaError> {
//! let guard = QuotaGuard::new(InMemoryQuotaStore::new());
//! let alice = CallerIdentity::from("alice");
//!
//! guard.login(&alice).await?;
//! let auth = guard.api_call_with_token(&alice, "", "analyze").await?;
//! assert!(auth.message().contains("29"));
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tower_service::Service;

use crate::clock::{Clock, SystemClock};
use crate::config::GuardConfig;
use crate::error::{QuotaError, Result};
use crate::identity::CallerIdentity;
use crate::model::{GuardStats, User};
use crate::policy;
use crate::store::{snapshot, QuotaStore, Snapshot};
use crate::telemetry::{emit_best_effort, NullSink, QuotaEvent, QuotaSink};

mod locks;
pub(crate) use locks::KeyLocks;

/// Log and wrap a backing-store failure.
pub(crate) fn storage_failure<E: std::error::Error>(err: E) -> QuotaError {
    tracing::warn!(error = %err, "quota store operation failed");
    QuotaError::storage(err)
}

/// Quota and tier enforcement over a [`QuotaStore`].
///
/// Cheap to clone; clones share the store, locks, and sink.
pub struct QuotaGuard<S, K = NullSink> {
    pub(crate) store: Arc<S>,
    clock: Arc<dyn Clock>,
    sink: K,
    pub(crate) locks: KeyLocks,
    config: GuardConfig,
    consumed_since_save: Arc<AtomicU32>,
}

impl<S, K: Clone> Clone for QuotaGuard<S, K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            sink: self.sink.clone(),
            locks: self.locks.clone(),
            config: self.config.clone(),
            consumed_since_save: self.consumed_since_save.clone(),
        }
    }
}

impl<S, K> std::fmt::Debug for QuotaGuard<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGuard")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: QuotaStore> QuotaGuard<S, NullSink> {
    /// Guard over `store` with the wall clock, no telemetry, and in-memory config.
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Guard over a store handle shared with other owners.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            sink: NullSink,
            locks: KeyLocks::default(),
            config: GuardConfig::default(),
            consumed_since_save: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl<S, K> QuotaGuard<S, K> {
    /// Override the clock (tests, simulations).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Route telemetry to `sink`.
    pub fn with_sink<K2>(self, sink: K2) -> QuotaGuard<S, K2> {
        QuotaGuard {
            store: self.store,
            clock: self.clock,
            sink,
            locks: self.locks,
            config: self.config,
            consumed_since_save: self.consumed_since_save,
        }
    }

    /// Override persistence settings.
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Borrow the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_millis()
    }
}

impl<S, K> QuotaGuard<S, K>
where
    S: QuotaStore + 'static,
    K: QuotaSink,
    <K as Service<QuotaEvent>>::Future: Send + 'static,
{
    /// Rehydrate from the configured snapshot file (if any) and return the
    /// guard ready to serve requests.
    pub async fn open(self) -> Result<Self> {
        if let Some(path) = &self.config.snapshot_path {
            match snapshot::load(path).await.map_err(storage_failure)? {
                Some(snap) => {
                    tracing::info!(
                        path = %path.display(),
                        users = snap.users.len(),
                        admins = snap.admins.len(),
                        tokens = snap.anonymous_usage.len(),
                        "restoring quota snapshot"
                    );
                    self.restore(snap).await?;
                }
                None => tracing::info!(path = %path.display(), "no quota snapshot, starting empty"),
            }
        }
        Ok(self)
    }

    /// Replace all state with `snapshot`.
    pub async fn restore(&self, snapshot: Snapshot) -> Result<()> {
        self.store.restore(snapshot).await.map_err(storage_failure)
    }

    /// Export all state as flat lists.
    pub async fn export_snapshot(&self) -> Result<Snapshot> {
        self.store.snapshot().await.map_err(storage_failure)
    }

    /// Write a snapshot to the configured path. Returns `false` when no path
    /// is configured.
    pub async fn persist(&self) -> Result<bool> {
        let Some(path) = &self.config.snapshot_path else {
            return Ok(false);
        };
        let _lock = self.locks.persist().await;
        // Everything counted so far is covered by the export below.
        self.consumed_since_save.store(0, Ordering::SeqCst);
        let snap = self.export_snapshot().await?;
        snapshot::save(path, &snap).await.map_err(storage_failure)?;
        Ok(true)
    }

    /// Persist on the way down when `persist_on_shutdown` is set.
    pub async fn shutdown(&self) -> Result<()> {
        if self.config.persist_on_shutdown && self.persist().await? {
            tracing::info!("quota snapshot written on shutdown");
        }
        Ok(())
    }

    /// User, admin, and anonymous-token counts.
    pub async fn stats(&self) -> Result<GuardStats> {
        Ok(GuardStats {
            users: self.store.user_count().await.map_err(storage_failure)?,
            admins: self.store.admin_count().await.map_err(storage_failure)?,
            anonymous_tokens: self.store.anonymous_token_count().await.map_err(storage_failure)?,
        })
    }

    pub(crate) async fn emit(&self, event: QuotaEvent) {
        emit_best_effort(self.sink.clone(), event).await;
    }

    /// Fetch `id`'s record with any due window reset applied. The reset is
    /// written back only if it changed the record.
    ///
    /// Callers must hold `id`'s user lock.
    pub(crate) async fn load_current(&self, id: &CallerIdentity, now: u64) -> Result<User> {
        let mut user = self
            .store
            .get_user(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(QuotaError::user_not_found)?;

        let due = policy::needs_reset(&user.quota, now);
        let reset = policy::apply_reset(&user.quota, now);
        if reset != user.quota {
            user.quota = reset;
            self.store.put_user(id, user.clone()).await.map_err(storage_failure)?;
            tracing::debug!(identity = %id, daily = due.daily, monthly = due.monthly, "quota window reset");
            self.emit(QuotaEvent::WindowReset {
                identity: id.clone(),
                daily: due.daily,
                monthly: due.monthly,
            })
            .await;
        }
        Ok(user)
    }

    /// Count an accepted consumption toward the autosave interval.
    pub(crate) async fn note_consumption(&self) {
        let Some(every) = self.config.autosave_every else {
            return;
        };
        self.consumed_since_save.fetch_add(1, Ordering::SeqCst);
        // Only the task that takes the counter back to zero saves this interval.
        let claimed = self
            .consumed_since_save
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n >= every).then_some(0))
            .is_ok();
        if claimed {
            // The consumption itself is already in the store; a failed autosave
            // only delays durability until the next save.
            if let Err(err) = self.persist().await {
                tracing::warn!(error = %err, "autosave failed");
            }
        }
    }
}
