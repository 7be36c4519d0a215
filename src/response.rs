//! Wire envelope for operation results.
//!
//! Success serializes as `{"ok": <value>}` and failure as
//! `{"err": {"code": "QUOTA_EXCEEDED", "message": "..."}}`.
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, QuotaError, Result};

/// Error half of [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&QuotaError> for ApiFailure {
    fn from(err: &QuotaError) -> Self {
        Self { code: err.code(), message: err.to_string() }
    }
}

/// Serializable result of a guard operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Ok(T),
    Err(ApiFailure),
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Error code, if this is a failure.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Ok(_) => None,
            Self::Err(failure) => Some(failure.code),
        }
    }

    /// Back to a `Result`, with failures as the wire-level pair.
    pub fn into_result(self) -> std::result::Result<T, ApiFailure> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(failure) => Err(failure),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Err(ApiFailure::from(&err)),
        }
    }
}
