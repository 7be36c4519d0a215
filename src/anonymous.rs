//! Lifetime-capped usage for callers with no stable identity.
//!
//! A token's count only ever goes up. There is no reset path: once a token
//! reaches the cap it is refused forever.

use tower_service::Service;

use crate::error::{QuotaError, Result};
use crate::guard::{storage_failure, QuotaGuard};
use crate::model::Authorization;
use crate::store::QuotaStore;
use crate::telemetry::{QuotaEvent, QuotaSink};
use crate::tier::anonymous_lifetime_cap;
use crate::validate;

impl<S, K> QuotaGuard<S, K>
where
    S: QuotaStore + 'static,
    K: QuotaSink,
    <K as Service<QuotaEvent>>::Future: Send + 'static,
{
    /// Lifetime usage recorded for `token`.
    pub async fn anonymous_usage(&self, token: &str) -> Result<u32> {
        validate::anonymous_token(token)?;
        self.store.anonymous_usage(token).await.map_err(storage_failure)
    }

    /// Count one call against `token`. The token must already be validated.
    pub(crate) async fn consume_anonymous(&self, token: &str) -> Result<Authorization> {
        let cap = anonymous_lifetime_cap();
        let _lock = self.locks.token(token).await;
        let used = self.store.anonymous_usage(token).await.map_err(storage_failure)?;
        if used >= cap {
            return Err(QuotaError::QuotaExceeded(format!(
                "Anonymous usage limit reached ({used} of {cap}). Please log in to continue."
            )));
        }
        let usage = self.store.increment_anonymous_usage(token).await.map_err(storage_failure)?;
        tracing::debug!(usage, cap, "anonymous call accepted");
        self.emit(QuotaEvent::AnonymousConsumed { usage, cap }).await;
        self.note_consumption().await;
        Ok(Authorization::Anonymous { usage, cap })
    }
}
