//! Quota policy: pure window and capacity arithmetic.
//!
//! Windows are fixed rolling spans measured from the last reset, not calendar
//! days or months. Resets are lazy: nothing runs in the background, a record is
//! re-evaluated only when it is next touched, and because every decision is
//! computed from absolute timestamps a record dormant for a year resets the
//! same way as one dormant for a day.
use crate::error::{QuotaError, Result};
use crate::model::UserQuota;
use crate::tier::{Tier, TierLimits};

/// Length of the daily window.
pub const DAILY_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;
/// Length of the monthly window (30 days).
pub const MONTHLY_WINDOW_MS: u64 = 30 * DAILY_WINDOW_MS;

/// Which windows have elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetDue {
    pub daily: bool,
    pub monthly: bool,
}

impl ResetDue {
    /// True if either window is due.
    pub fn any(&self) -> bool {
        self.daily || self.monthly
    }
}

/// Fixed ceilings for `tier`.
pub fn limits_for(tier: Tier) -> TierLimits {
    TierLimits::for_tier(tier)
}

/// Determine which counters are due for a reset at `now`.
///
/// A clock that moved backwards yields no reset.
pub fn needs_reset(quota: &UserQuota, now: u64) -> ResetDue {
    ResetDue {
        daily: now.saturating_sub(quota.last_reset_daily) >= DAILY_WINDOW_MS,
        monthly: now.saturating_sub(quota.last_reset_monthly) >= MONTHLY_WINDOW_MS,
    }
}

/// Zero exactly the due counters and stamp their windows to `now`.
pub fn apply_reset(quota: &UserQuota, now: u64) -> UserQuota {
    let due = needs_reset(quota, now);
    let mut next = *quota;
    if due.daily {
        next.daily_usage = 0;
        next.last_reset_daily = now;
    }
    if due.monthly {
        next.monthly_usage = 0;
        next.last_reset_monthly = now;
    }
    next
}

/// Whether one more consumption fits under both ceilings.
pub fn can_consume(quota: &UserQuota) -> bool {
    let limits = quota.limits();
    quota.daily_usage < limits.daily && quota.monthly_usage < limits.monthly
}

/// Count one consumption against both windows.
pub fn consume(quota: &UserQuota) -> UserQuota {
    let mut next = *quota;
    next.daily_usage = next.daily_usage.saturating_add(1);
    next.monthly_usage = next.monthly_usage.saturating_add(1);
    next
}

/// Remaining `(daily, monthly)` capacity, floored at zero.
pub fn remaining(quota: &UserQuota) -> (u32, u32) {
    let limits = quota.limits();
    (
        limits.daily.saturating_sub(quota.daily_usage),
        limits.monthly.saturating_sub(quota.monthly_usage),
    )
}

/// Instants at which the `(daily, monthly)` windows next roll over.
pub fn resets_at(quota: &UserQuota) -> (u64, u64) {
    (
        quota.last_reset_daily.saturating_add(DAILY_WINDOW_MS),
        quota.last_reset_monthly.saturating_add(MONTHLY_WINDOW_MS),
    )
}

/// Validate a tier change. Upgrading never touches usage counters.
pub fn check_transition(from: Tier, to: Tier) -> Result<()> {
    match (from, to) {
        (_, Tier::Anonymous) => Err(QuotaError::InvalidTier(
            "Cannot move an identified user to the anonymous tier".into(),
        )),
        (from, to) if from == to => {
            Err(QuotaError::InvalidTier(format!("User is already on the {to} tier")))
        }
        (Tier::Premium, Tier::Authenticated) => Err(QuotaError::InvalidTier(
            "Downgrading from premium to authenticated is not supported".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;
    const MINUTE: u64 = 60 * 1000;

    fn used(daily: u32, monthly: u32) -> UserQuota {
        UserQuota { daily_usage: daily, monthly_usage: monthly, ..UserQuota::fresh(Tier::Authenticated, T0) }
    }

    #[test]
    fn daily_reset_boundary() {
        let q = used(5, 5);
        assert!(!needs_reset(&q, T0 + DAILY_WINDOW_MS - MINUTE).daily);
        assert!(needs_reset(&q, T0 + DAILY_WINDOW_MS).daily);
        assert!(!needs_reset(&q, T0 + DAILY_WINDOW_MS).monthly);
    }

    #[test]
    fn apply_reset_zeroes_only_due_counters() {
        let q = used(5, 12);
        let now = T0 + DAILY_WINDOW_MS;
        let next = apply_reset(&q, now);
        assert_eq!(next.daily_usage, 0);
        assert_eq!(next.last_reset_daily, now);
        assert_eq!(next.monthly_usage, 12);
        assert_eq!(next.last_reset_monthly, T0);
        assert_eq!(next.tier, q.tier);
    }

    #[test]
    fn apply_reset_before_window_is_identity() {
        let q = used(5, 12);
        assert_eq!(apply_reset(&q, T0 + DAILY_WINDOW_MS - MINUTE), q);
    }

    #[test]
    fn monthly_window_is_thirty_days() {
        let q = used(3, 29);
        assert!(!needs_reset(&q, T0 + MONTHLY_WINDOW_MS - 1).monthly);
        let next = apply_reset(&q, T0 + MONTHLY_WINDOW_MS);
        assert_eq!((next.daily_usage, next.monthly_usage), (0, 0));
    }

    #[test]
    fn backwards_clock_never_resets() {
        let q = used(5, 5);
        assert!(!needs_reset(&q, T0 - DAILY_WINDOW_MS * 2).any());
    }

    #[test]
    fn capacity_checks_both_windows() {
        assert!(can_consume(&used(29, 29)));
        assert!(!can_consume(&used(30, 0)));
        assert!(!can_consume(&used(0, 30)));
        assert_eq!(remaining(&used(10, 25)), (20, 5));
        assert_eq!(remaining(&used(40, 40)), (0, 0));
    }

    #[test]
    fn consume_increments_both() {
        let q = consume(&used(1, 7));
        assert_eq!((q.daily_usage, q.monthly_usage), (2, 8));
    }

    #[test]
    fn tier_transitions() {
        assert!(check_transition(Tier::Authenticated, Tier::Premium).is_ok());
        assert!(check_transition(Tier::Authenticated, Tier::Anonymous).is_err());
        assert!(check_transition(Tier::Premium, Tier::Authenticated).is_err());
        assert!(check_transition(Tier::Premium, Tier::Premium).is_err());
        let err = check_transition(Tier::Authenticated, Tier::Authenticated).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::InvalidTier);
    }

    #[test]
    fn reset_horizon() {
        let q = used(0, 0);
        assert_eq!(resets_at(&q), (T0 + DAILY_WINDOW_MS, T0 + MONTHLY_WINDOW_MS));
    }
}
