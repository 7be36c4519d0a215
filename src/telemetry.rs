//! Telemetry for quota decisions.
//!
//! Every state change and rejection the guard makes is described by a
//! [`QuotaEvent`]. Events flow through [`QuotaSink`] implementations, which are
//! plain `tower::Service<QuotaEvent>`s, so sinks compose with ordinary tower
//! combinators.
//!
//! Emission is best-effort: a sink that is not ready or fails never fails the
//! request that produced the event.
//!
//! ```rust
//! use tierguard::telemetry::QuotaEvent;
//! use tierguard::Tier;
//!
//! let event = QuotaEvent::TierChanged {
//!     identity: "alice".into(),
//!     from: Tier::Authenticated,
//!     to: Tier::Premium,
//! };
//! assert_eq!(event.kind(), "tier_changed");
//! ```

pub mod events;
pub mod sinks;

pub use events::QuotaEvent;
pub use sinks::{
    emit_best_effort, ComposedSinkError, LogSink, MemorySink, MulticastSink, NullSink, QuotaSink,
};
