//! Persisted records and the read-only views handed back to callers.
use crate::tier::{Tier, TierLimits};
use serde::{Deserialize, Serialize};

/// Usage counters and window anchors for one user.
///
/// Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuota {
    /// Current tier.
    pub tier: Tier,
    /// Consumptions in the current daily window.
    pub daily_usage: u32,
    /// Consumptions in the current monthly window.
    pub monthly_usage: u32,
    /// Start of the current daily window.
    pub last_reset_daily: u64,
    /// Start of the current monthly window.
    pub last_reset_monthly: u64,
}

impl UserQuota {
    /// Zeroed counters on `tier` with both windows starting at `now`.
    pub fn fresh(tier: Tier, now: u64) -> Self {
        Self {
            tier,
            daily_usage: 0,
            monthly_usage: 0,
            last_reset_daily: now,
            last_reset_monthly: now,
        }
    }

    /// Limits for the current tier.
    pub fn limits(&self) -> TierLimits {
        self.tier.limits()
    }
}

/// A user record, keyed 1:1 by [`CallerIdentity`](crate::CallerIdentity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at: u64,
    pub is_registered: bool,
    pub quota: UserQuota,
}

impl User {
    /// Record created by a first `login`: unregistered, default tier.
    pub fn provisioned(now: u64) -> Self {
        Self {
            display_name: None,
            email: None,
            created_at: now,
            is_registered: false,
            quota: UserQuota::fresh(Tier::Authenticated, now),
        }
    }

    /// Record created by `register` on an unseen identity.
    pub fn registered(full_name: String, email: String, now: u64) -> Self {
        Self {
            display_name: Some(full_name),
            email: Some(email),
            created_at: now,
            is_registered: true,
            quota: UserQuota::fresh(Tier::Authenticated, now),
        }
    }

    /// Public profile view.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            full_name: self.display_name.clone(),
            email: self.email.clone(),
            tier: self.quota.tier,
        }
    }
}

/// Result of `get_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub tier: Tier,
}

/// Result of `get_quota_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub tier: Tier,
    pub daily_usage: u32,
    pub monthly_usage: u32,
    pub daily_limit: u32,
    pub monthly_limit: u32,
    pub remaining_daily: u32,
    pub remaining_monthly: u32,
    /// When the daily window rolls over, epoch milliseconds.
    pub daily_resets_at: u64,
    /// When the monthly window rolls over, epoch milliseconds.
    pub monthly_resets_at: u64,
}

/// Accepted request, ready to be forwarded downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Authorization {
    /// Anonymous token path; `usage` counts this call.
    Anonymous { usage: u32, cap: u32 },
    /// Identified path; remaining capacity after this call.
    Identified { tier: Tier, remaining_daily: u32, remaining_monthly: u32 },
}

impl Authorization {
    /// Human-readable summary returned to the caller.
    pub fn message(&self) -> String {
        match self {
            Self::Anonymous { usage, cap } => format!("Usage: {usage} of {cap}"),
            Self::Identified { tier, remaining_daily, remaining_monthly } => format!(
                "Request authorized ({tier}). Remaining today: {remaining_daily}, this month: {remaining_monthly}"
            ),
        }
    }
}

/// Counts for the health view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuardStats {
    pub users: usize,
    pub admins: usize,
    pub anonymous_tokens: usize,
}
