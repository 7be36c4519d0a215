use crate::error::ErrorCode;
use crate::identity::CallerIdentity;
use crate::tier::Tier;
use serde::Serialize;
use std::fmt;

/// Events emitted by the guard.
///
/// Anonymous tokens are never included: they act as bearer credentials for the
/// lifetime cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotaEvent {
    /// An identified caller consumed one unit.
    Consumed {
        identity: CallerIdentity,
        tier: Tier,
        /// Daily usage after this consumption
        daily_usage: u32,
        /// Monthly usage after this consumption
        monthly_usage: u32,
    },
    /// An anonymous token consumed one unit of its lifetime cap.
    AnonymousConsumed { usage: u32, cap: u32 },
    /// A request was refused.
    Rejected {
        /// Caller (the anonymous sentinel for token requests)
        identity: CallerIdentity,
        code: ErrorCode,
    },
    /// A lazy reset zeroed one or both windows and was persisted.
    WindowReset { identity: CallerIdentity, daily: bool, monthly: bool },
    /// A user record was created by `login` or `register`.
    UserCreated { identity: CallerIdentity, registered: bool },
    /// Profile fields were overwritten by `register`.
    UserUpdated { identity: CallerIdentity },
    /// A user record was deleted.
    UserDeleted { identity: CallerIdentity },
    /// A tier transition was applied.
    TierChanged { identity: CallerIdentity, from: Tier, to: Tier },
    /// Admin privileges were granted or revoked.
    AdminChanged { identity: CallerIdentity, granted: bool },
}

impl QuotaEvent {
    /// Stable snake_case label, matching the serialized `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Consumed { .. } => "consumed",
            Self::AnonymousConsumed { .. } => "anonymous_consumed",
            Self::Rejected { .. } => "rejected",
            Self::WindowReset { .. } => "window_reset",
            Self::UserCreated { .. } => "user_created",
            Self::UserUpdated { .. } => "user_updated",
            Self::UserDeleted { .. } => "user_deleted",
            Self::TierChanged { .. } => "tier_changed",
            Self::AdminChanged { .. } => "admin_changed",
        }
    }
}

impl fmt::Display for QuotaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumed { identity, tier, daily_usage, monthly_usage } => write!(
                f,
                "Consumed({identity}, tier={tier}, daily={daily_usage}, monthly={monthly_usage})"
            ),
            Self::AnonymousConsumed { usage, cap } => {
                write!(f, "AnonymousConsumed({usage}/{cap})")
            }
            Self::Rejected { identity, code } => write!(f, "Rejected({identity}, {code})"),
            Self::WindowReset { identity, daily, monthly } => {
                write!(f, "WindowReset({identity}, daily={daily}, monthly={monthly})")
            }
            Self::UserCreated { identity, registered } => {
                write!(f, "UserCreated({identity}, registered={registered})")
            }
            Self::UserUpdated { identity } => write!(f, "UserUpdated({identity})"),
            Self::UserDeleted { identity } => write!(f, "UserDeleted({identity})"),
            Self::TierChanged { identity, from, to } => {
                write!(f, "TierChanged({identity}, {from} -> {to})")
            }
            Self::AdminChanged { identity, granted } => {
                write!(f, "AdminChanged({identity}, granted={granted})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let e = QuotaEvent::Consumed {
            identity: "alice".into(),
            tier: Tier::Authenticated,
            daily_usage: 3,
            monthly_usage: 4,
        };
        assert_eq!(e.to_string(), "Consumed(alice, tier=authenticated, daily=3, monthly=4)");
        let e = QuotaEvent::Rejected { identity: "bob".into(), code: ErrorCode::QuotaExceeded };
        assert_eq!(e.to_string(), "Rejected(bob, QUOTA_EXCEEDED)");
    }

    #[test]
    fn json_kind_matches_label() {
        let e = QuotaEvent::WindowReset { identity: "alice".into(), daily: true, monthly: false };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["kind"], e.kind());
        assert_eq!(v["identity"], "alice");
        assert_eq!(v["daily"], true);
    }
}
