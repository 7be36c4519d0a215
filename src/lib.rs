#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # tierguard
//!
//! Tiered quota enforcement for metered APIs: per-user daily and monthly
//! ceilings, a lifetime cap for anonymous tokens, and lazy rolling-window
//! resets.
//!
//! ## Features
//!
//! - **Three tiers** (`anonymous`, `authenticated`, `premium`) with fixed limits
//! - **Rolling windows** of 24 hours and 30 days, reset on next touch
//! - **Anonymous tokens** capped at three calls for their whole lifetime
//! - **Pluggable storage** via the async [`QuotaStore`] trait, with snapshot
//!   and restore
//! - **Tower middleware** ([`QuotaLayer`]) to meter any service
//! - **Telemetry** as a stream of [`QuotaEvent`]s into tower-based sinks
//!
//! ## Quick Start
//!
//! ```rust
//! use tierguard::{CallerIdentity, InMemoryQuotaStore, QuotaGuard, Tier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tierguard::QuotaError> {
//!     let guard = QuotaGuard::new(InMemoryQuotaStore::new());
//!
//!     // Anonymous callers are limited by token.
//!     let anon = CallerIdentity::anonymous();
//!     let auth = guard.api_call_with_token(&anon, "tok12345", "analyze").await?;
//!     assert_eq!(auth.message(), "Usage: 1 of 3");
//!
//!     // Identified callers log in first, then draw on their tier.
//!     let alice = CallerIdentity::from("alice");
//!     guard.login(&alice).await?;
//!     guard.upgrade_tier(&alice, Tier::Premium).await?;
//!     guard.api_call_with_token(&alice, "", "analyze").await?;
//!
//!     let status = guard.get_quota_status(&alice).await?;
//!     assert_eq!(status.daily_usage, 1);
//!     Ok(())
//! }
//! ```

mod admin;
mod anonymous;
mod authorize;
pub mod clock;
pub mod config;
mod directory;
pub mod error;
mod guard;
pub mod identity;
pub mod middleware;
pub mod model;
pub mod policy;
pub mod prelude;
pub mod response;
pub mod store;
pub mod telemetry;
pub mod tier;
pub mod validate;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GuardConfig;
pub use error::{ErrorCode, QuotaError, Result};
pub use guard::QuotaGuard;
pub use identity::{CallerIdentity, ANONYMOUS};
pub use middleware::{GuardError, QuotaLayer, QuotaRequest, QuotaService};
pub use model::{Authorization, GuardStats, QuotaStatus, User, UserProfile, UserQuota};
pub use response::{ApiFailure, ApiResponse};
pub use store::{InMemoryQuotaStore, MemoryStoreError, QuotaStore, Snapshot};
pub use telemetry::{
    emit_best_effort, LogSink, MemorySink, MulticastSink, NullSink, QuotaEvent, QuotaSink,
};
pub use tier::{Tier, TierLimits};
