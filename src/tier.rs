//! Access tiers and their fixed limits.
//!
//! [`TierLimits::for_tier`] is the only place tier-specific numbers live.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access class determining quota ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Callers with no stable identity. Never stored on a user record; the
    /// anonymous token tracker enforces this tier's cap instead.
    Anonymous,
    /// Default tier for identified callers.
    Authenticated,
    /// Paid tier, effectively unlimited.
    Premium,
}

impl Tier {
    /// Lowercase name used in messages and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::Premium => "premium",
        }
    }

    /// Daily and monthly ceilings for this tier.
    pub const fn limits(self) -> TierLimits {
        TierLimits::for_tier(self)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily/monthly ceilings for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Max consumptions per rolling 24h window.
    pub daily: u32,
    /// Max consumptions per rolling 30-day window.
    pub monthly: u32,
}

impl TierLimits {
    /// The static tier table.
    pub const fn for_tier(tier: Tier) -> Self {
        match tier {
            // Lifetime cap, enforced by the anonymous token tracker.
            Tier::Anonymous => Self { daily: 3, monthly: 3 },
            Tier::Authenticated => Self { daily: 30, monthly: 30 },
            Tier::Premium => Self { daily: 1_000_000, monthly: 1_000_000 },
        }
    }

    /// Number of consumptions a fresh record on this tier can make.
    pub fn fresh_capacity(&self) -> u32 {
        self.daily.min(self.monthly)
    }
}

/// Lifetime cap for a single anonymous token.
pub const fn anonymous_lifetime_cap() -> u32 {
    TierLimits::for_tier(Tier::Anonymous).monthly
}
