//! Per-request authorization.
//!
//! [`QuotaGuard::api_call_with_token`] is the single entry point every metered
//! request flows through. It branches on the caller:
//!
//! - anonymous: validate operation and token, then count against the token's
//!   lifetime cap;
//! - identified: look up the record (no implicit provisioning), apply any due
//!   reset, check both windows, and count one unit.
//!
//! All checks run before the single write that records the consumption, so a
//! rejected request leaves the store as it found it (apart from a due reset,
//! which is persisted regardless because it is correct at that instant).

use tower_service::Service;

use crate::error::{QuotaError, Result};
use crate::guard::{storage_failure, QuotaGuard};
use crate::identity::CallerIdentity;
use crate::model::Authorization;
use crate::policy;
use crate::store::QuotaStore;
use crate::telemetry::{QuotaEvent, QuotaSink};
use crate::validate;

impl<S, K> QuotaGuard<S, K>
where
    S: QuotaStore + 'static,
    K: QuotaSink,
    <K as Service<QuotaEvent>>::Future: Send + 'static,
{
    /// Decide whether `caller` may perform `operation` now, counting it if so.
    ///
    /// `operation` is checked for every caller, so an empty or overlong name
    /// fails with `EMPTY_FIELD`/`INVALID_INPUT` for identified callers too.
    /// `token` is only consulted for the anonymous sentinel. On success the
    /// request may proceed downstream; this crate does not call it.
    pub async fn api_call_with_token(
        &self,
        caller: &CallerIdentity,
        token: &str,
        operation: &str,
    ) -> Result<Authorization> {
        let decision = self.authorize(caller, token, operation).await;
        if let Err(err) = &decision {
            tracing::debug!(identity = %caller, operation, code = %err.code(), "request rejected");
            self.emit(QuotaEvent::Rejected { identity: caller.clone(), code: err.code() }).await;
        }
        decision
    }

    async fn authorize(
        &self,
        caller: &CallerIdentity,
        token: &str,
        operation: &str,
    ) -> Result<Authorization> {
        validate::operation_name(operation)?;
        if caller.is_anonymous() {
            validate::anonymous_token(token)?;
            self.consume_anonymous(token).await
        } else {
            self.consume_identified(caller).await
        }
    }

    async fn consume_identified(&self, caller: &CallerIdentity) -> Result<Authorization> {
        let _lock = self.locks.user(caller).await;
        let mut user = self.load_current(caller, self.now()).await?;
        let quota = user.quota;
        if !policy::can_consume(&quota) {
            let limits = quota.limits();
            return Err(QuotaError::QuotaExceeded(format!(
                "Quota exceeded for the {} tier: {} of {} today, {} of {} this month",
                quota.tier, quota.daily_usage, limits.daily, quota.monthly_usage, limits.monthly
            )));
        }

        user.quota = policy::consume(&quota);
        self.store.put_user(caller, user.clone()).await.map_err(storage_failure)?;
        self.emit(QuotaEvent::Consumed {
            identity: caller.clone(),
            tier: user.quota.tier,
            daily_usage: user.quota.daily_usage,
            monthly_usage: user.quota.monthly_usage,
        })
        .await;
        self.note_consumption().await;

        let (remaining_daily, remaining_monthly) = policy::remaining(&user.quota);
        Ok(Authorization::Identified { tier: user.quota.tier, remaining_daily, remaining_monthly })
    }
}
