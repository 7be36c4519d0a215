//! Convenient re-exports for common tierguard types.
pub use crate::{
    clock::{Clock, ManualClock, SystemClock},
    config::GuardConfig,
    error::{ErrorCode, QuotaError},
    identity::CallerIdentity,
    middleware::{GuardError, QuotaLayer, QuotaRequest},
    model::{Authorization, QuotaStatus, User, UserProfile},
    store::{InMemoryQuotaStore, QuotaStore, Snapshot},
    telemetry::{LogSink, MemorySink, QuotaEvent, QuotaSink},
    tier::Tier,
    QuotaGuard,
};
