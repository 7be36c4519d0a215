//! User directory operations.
//!
//! Every operation here requires a stable identity and rejects the anonymous
//! sentinel before touching storage. Records are created lazily by `login`
//! (unregistered, `Authenticated` tier) or by `register`.

use tower_service::Service;

use crate::error::{QuotaError, Result};
use crate::guard::{storage_failure, QuotaGuard};
use crate::identity::CallerIdentity;
use crate::model::{QuotaStatus, User, UserProfile};
use crate::policy;
use crate::store::QuotaStore;
use crate::telemetry::{QuotaEvent, QuotaSink};
use crate::tier::Tier;
use crate::validate;

impl<S, K> QuotaGuard<S, K>
where
    S: QuotaStore + 'static,
    K: QuotaSink,
    <K as Service<QuotaEvent>>::Future: Send + 'static,
{
    /// True iff `caller` has a stable identity. Never touches storage.
    pub fn is_authenticated(&self, caller: &CallerIdentity) -> bool {
        !caller.is_anonymous()
    }

    /// Return the caller's record, creating it on first sight.
    ///
    /// Idempotent: an existing record is returned as stored, with no reset
    /// and no write.
    pub async fn login(&self, caller: &CallerIdentity) -> Result<User> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("log in"));
        }
        let _lock = self.locks.user(caller).await;
        if let Some(user) = self.store.get_user(caller).await.map_err(storage_failure)? {
            tracing::debug!(identity = %caller, "login: existing user");
            return Ok(user);
        }

        let user = User::provisioned(self.now());
        self.store.put_user(caller, user.clone()).await.map_err(storage_failure)?;
        tracing::info!(identity = %caller, tier = %user.quota.tier, "login: user provisioned");
        self.emit(QuotaEvent::UserCreated { identity: caller.clone(), registered: false }).await;
        Ok(user)
    }

    /// Attach a name and email to the caller, marking them registered.
    ///
    /// An existing record keeps its `created_at` and quota; only the profile
    /// fields and the registered flag change.
    pub async fn register(
        &self,
        caller: &CallerIdentity,
        full_name: &str,
        email: &str,
    ) -> Result<User> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("register"));
        }
        validate::full_name(full_name)?;
        validate::email(email)?;

        let _lock = self.locks.user(caller).await;
        let existing = self.store.get_user(caller).await.map_err(storage_failure)?;
        let (user, event) = match existing {
            Some(mut user) => {
                user.display_name = Some(full_name.to_string());
                user.email = Some(email.to_string());
                user.is_registered = true;
                (user, QuotaEvent::UserUpdated { identity: caller.clone() })
            }
            None => (
                User::registered(full_name.to_string(), email.to_string(), self.now()),
                QuotaEvent::UserCreated { identity: caller.clone(), registered: true },
            ),
        };
        self.store.put_user(caller, user.clone()).await.map_err(storage_failure)?;
        tracing::info!(identity = %caller, "user registered");
        self.emit(event).await;
        Ok(user)
    }

    /// Public profile of the caller.
    pub async fn get_user(&self, caller: &CallerIdentity) -> Result<UserProfile> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("view a profile"));
        }
        self.store
            .get_user(caller)
            .await
            .map_err(storage_failure)?
            .map(|user| user.profile())
            .ok_or_else(QuotaError::user_not_found)
    }

    /// Remove the caller's record.
    pub async fn delete_user(&self, caller: &CallerIdentity) -> Result<()> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("delete a profile"));
        }
        let _lock = self.locks.user(caller).await;
        match self.store.remove_user(caller).await.map_err(storage_failure)? {
            Some(_) => {
                tracing::info!(identity = %caller, "user deleted");
                self.emit(QuotaEvent::UserDeleted { identity: caller.clone() }).await;
                Ok(())
            }
            None => Err(QuotaError::user_not_found()),
        }
    }

    /// Current usage and limits, applying (and persisting) any due reset but
    /// never consuming.
    pub async fn get_quota_status(&self, caller: &CallerIdentity) -> Result<QuotaStatus> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("view quota status"));
        }
        let _lock = self.locks.user(caller).await;
        let user = self.load_current(caller, self.now()).await?;
        Ok(status_of(&user))
    }

    /// Move the caller to `new_tier`, leaving usage counters untouched.
    ///
    /// Rejected with `InvalidTier`: `Anonymous` as a target, `Premium` to
    /// `Authenticated`, and no-op transitions.
    pub async fn upgrade_tier(&self, caller: &CallerIdentity, new_tier: Tier) -> Result<User> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("change tiers"));
        }
        if new_tier == Tier::Anonymous {
            return Err(QuotaError::InvalidTier(
                "Cannot move an identified user to the anonymous tier".into(),
            ));
        }

        let _lock = self.locks.user(caller).await;
        let mut user = self
            .store
            .get_user(caller)
            .await
            .map_err(storage_failure)?
            .ok_or_else(QuotaError::user_not_found)?;
        let from = user.quota.tier;
        policy::check_transition(from, new_tier)?;

        user.quota.tier = new_tier;
        self.store.put_user(caller, user.clone()).await.map_err(storage_failure)?;
        tracing::info!(identity = %caller, %from, to = %new_tier, "tier changed");
        self.emit(QuotaEvent::TierChanged { identity: caller.clone(), from, to: new_tier }).await;
        Ok(user)
    }
}

fn status_of(user: &User) -> QuotaStatus {
    let quota = &user.quota;
    let limits = quota.limits();
    let (remaining_daily, remaining_monthly) = policy::remaining(quota);
    let (daily_resets_at, monthly_resets_at) = policy::resets_at(quota);
    QuotaStatus {
        tier: quota.tier,
        daily_usage: quota.daily_usage,
        monthly_usage: quota.monthly_usage,
        daily_limit: limits.daily,
        monthly_limit: limits.monthly,
        remaining_daily,
        remaining_monthly,
        daily_resets_at,
        monthly_resets_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorCode;
    use crate::store::InMemoryQuotaStore;
    use crate::telemetry::MemorySink;

    const T0: u64 = 1_700_000_000_000;

    fn guard() -> (QuotaGuard<InMemoryQuotaStore, MemorySink>, ManualClock, MemorySink) {
        let clock = ManualClock::new(T0);
        let sink = MemorySink::new();
        let guard = QuotaGuard::new(InMemoryQuotaStore::new())
            .with_clock(clock.clone())
            .with_sink(sink.clone());
        (guard, clock, sink)
    }

    #[tokio::test]
    async fn anonymous_is_rejected_everywhere() {
        let (g, _, _) = guard();
        let anon = CallerIdentity::anonymous();
        assert!(!g.is_authenticated(&anon));
        assert_eq!(g.login(&anon).await.unwrap_err().code(), ErrorCode::AnonymousNotAllowed);
        assert_eq!(
            g.register(&anon, "Bob", "b@x.com").await.unwrap_err().code(),
            ErrorCode::AnonymousNotAllowed
        );
        assert_eq!(g.get_user(&anon).await.unwrap_err().code(), ErrorCode::AnonymousNotAllowed);
        assert_eq!(g.delete_user(&anon).await.unwrap_err().code(), ErrorCode::AnonymousNotAllowed);
        assert_eq!(
            g.get_quota_status(&anon).await.unwrap_err().code(),
            ErrorCode::AnonymousNotAllowed
        );
        assert_eq!(
            g.upgrade_tier(&anon, Tier::Premium).await.unwrap_err().code(),
            ErrorCode::AnonymousNotAllowed
        );
        assert_eq!(g.stats().await.unwrap().users, 0);
    }

    #[tokio::test]
    async fn login_provisions_once() {
        let (g, clock, sink) = guard();
        let alice = CallerIdentity::from("alice");
        let first = g.login(&alice).await.unwrap();
        clock.advance(std::time::Duration::from_secs(60));
        let second = g.login(&alice).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.created_at, T0);
        assert_eq!(sink.kinds(), vec!["user_created"]);
        assert!(g.is_authenticated(&alice));
    }

    #[tokio::test]
    async fn register_validates_before_storage() {
        let (g, _, sink) = guard();
        let bob = CallerIdentity::from("bob");
        assert_eq!(g.register(&bob, "B", "b@x.com").await.unwrap_err().code(), ErrorCode::InvalidInput);
        assert_eq!(g.register(&bob, "", "b@x.com").await.unwrap_err().code(), ErrorCode::EmptyField);
        assert_eq!(g.register(&bob, "Bob", "bx.com").await.unwrap_err().code(), ErrorCode::InvalidEmail);
        assert_eq!(g.stats().await.unwrap().users, 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn status_reports_limits_and_horizon() {
        let (g, _, _) = guard();
        let alice = CallerIdentity::from("alice");
        g.login(&alice).await.unwrap();
        let status = g.get_quota_status(&alice).await.unwrap();
        assert_eq!(status.tier, Tier::Authenticated);
        assert_eq!((status.daily_limit, status.monthly_limit), (30, 30));
        assert_eq!((status.remaining_daily, status.remaining_monthly), (30, 30));
        assert_eq!(status.daily_resets_at, T0 + policy::DAILY_WINDOW_MS);
        assert_eq!(status.monthly_resets_at, T0 + policy::MONTHLY_WINDOW_MS);
    }

    #[tokio::test]
    async fn missing_user_paths() {
        let (g, _, _) = guard();
        let ghost = CallerIdentity::from("ghost");
        assert_eq!(g.get_user(&ghost).await.unwrap_err().code(), ErrorCode::UserNotFound);
        assert_eq!(g.delete_user(&ghost).await.unwrap_err().code(), ErrorCode::UserNotFound);
        assert_eq!(g.get_quota_status(&ghost).await.unwrap_err().code(), ErrorCode::UserNotFound);
        assert_eq!(
            g.upgrade_tier(&ghost, Tier::Premium).await.unwrap_err().code(),
            ErrorCode::UserNotFound
        );
    }

    #[tokio::test]
    async fn delete_then_login_starts_fresh() {
        let (g, clock, _) = guard();
        let alice = CallerIdentity::from("alice");
        g.login(&alice).await.unwrap();
        g.upgrade_tier(&alice, Tier::Premium).await.unwrap();
        g.delete_user(&alice).await.unwrap();
        clock.advance(std::time::Duration::from_secs(5));
        let user = g.login(&alice).await.unwrap();
        assert_eq!(user.quota.tier, Tier::Authenticated);
        assert_eq!(user.created_at, T0 + 5_000);
    }
}
