//! Error taxonomy for quota and directory operations.
//!
//! Every failure carries a stable [`ErrorCode`] plus a human-readable message.
//! Callers branch on the variant (or its code), never on the message text.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable machine-readable error codes exposed at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Daily, monthly, or anonymous lifetime cap reached.
    QuotaExceeded,
    /// No user record for the caller; `login` or `register` first.
    UserNotFound,
    /// Operation requires a stable identity.
    AnonymousNotAllowed,
    /// Illegal or redundant tier transition.
    InvalidTier,
    /// Email failed the shallow shape check.
    InvalidEmail,
    /// Field present but out of bounds.
    InvalidInput,
    /// Required field missing or blank.
    EmptyField,
    /// Caller lacks admin privileges.
    PermissionDenied,
    /// Backing store rejected a read or write.
    StorageFailure,
}

impl ErrorCode {
    /// Wire representation, e.g. `QUOTA_EXCEEDED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::AnonymousNotAllowed => "ANONYMOUS_NOT_ALLOWED",
            Self::InvalidTier => "INVALID_TIER",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidInput => "INVALID_INPUT",
            Self::EmptyField => "EMPTY_FIELD",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for every guard operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuotaError {
    /// A usage cap was hit. The message names the tier (or the anonymous cap).
    #[error("{0}")]
    QuotaExceeded(String),
    /// The caller has no user record.
    #[error("{0}")]
    UserNotFound(String),
    /// The anonymous sentinel called an identity-only operation.
    #[error("{0}")]
    AnonymousNotAllowed(String),
    /// Tier transition rejected.
    #[error("{0}")]
    InvalidTier(String),
    /// Email rejected.
    #[error("{0}")]
    InvalidEmail(String),
    /// Field out of bounds.
    #[error("{0}")]
    InvalidInput(String),
    /// Required field missing.
    #[error("{0}")]
    EmptyField(String),
    /// Admin-only operation called by a non-admin.
    #[error("{0}")]
    PermissionDenied(String),
    /// The store failed; no state was changed by this request.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl QuotaError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            Self::UserNotFound(_) => ErrorCode::UserNotFound,
            Self::AnonymousNotAllowed(_) => ErrorCode::AnonymousNotAllowed,
            Self::InvalidTier(_) => ErrorCode::InvalidTier,
            Self::InvalidEmail(_) => ErrorCode::InvalidEmail,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::EmptyField(_) => ErrorCode::EmptyField,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Wrap a backing-store error.
    pub fn storage<E: std::error::Error>(err: E) -> Self {
        Self::Storage(err.to_string())
    }

    /// Standard rejection for identity-only operations.
    pub(crate) fn anonymous(operation: &str) -> Self {
        Self::AnonymousNotAllowed(format!(
            "Anonymous callers cannot {operation}. Please authenticate first."
        ))
    }

    /// Standard rejection for a missing user record.
    pub(crate) fn user_not_found() -> Self {
        Self::UserNotFound("User not found. Please log in or register first.".into())
    }

    /// Check if this is a capacity rejection.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }

    /// Check if this error came from input validation (no storage was touched).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidEmail(_) | Self::InvalidInput(_) | Self::EmptyField(_))
    }
}

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, QuotaError>;
