//! Shallow input checks run before any storage access.
//!
//! Lengths are counted in characters, not bytes. A value made only of
//! whitespace counts as empty.
use crate::error::{QuotaError, Result};

/// Longest accepted operation name.
pub const MAX_OPERATION_NAME: usize = 50;
/// Shortest accepted anonymous token.
pub const MIN_TOKEN_LEN: usize = 8;
/// Accepted full-name length range.
pub const FULL_NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;
/// Shortest accepted email.
pub const MIN_EMAIL_LEN: usize = 5;

fn require(field: &str, value: &str) -> Result<usize> {
    if value.trim().is_empty() {
        return Err(QuotaError::EmptyField(format!("{field} must not be empty")));
    }
    Ok(value.chars().count())
}

/// Operation name: non-empty, at most 50 characters.
pub fn operation_name(name: &str) -> Result<()> {
    let len = require("operation name", name)?;
    if len > MAX_OPERATION_NAME {
        return Err(QuotaError::InvalidInput(format!(
            "operation name must be at most {MAX_OPERATION_NAME} characters (got {len})"
        )));
    }
    Ok(())
}

/// Anonymous token: non-empty, at least 8 characters.
pub fn anonymous_token(token: &str) -> Result<()> {
    let len = require("token", token)?;
    if len < MIN_TOKEN_LEN {
        return Err(QuotaError::InvalidInput(format!(
            "token must be at least {MIN_TOKEN_LEN} characters (got {len})"
        )));
    }
    Ok(())
}

/// Full name: 2 to 100 characters.
pub fn full_name(name: &str) -> Result<()> {
    let len = require("full name", name)?;
    if !FULL_NAME_LEN.contains(&len) {
        return Err(QuotaError::InvalidInput(format!(
            "full name must be between {} and {} characters (got {len})",
            FULL_NAME_LEN.start(),
            FULL_NAME_LEN.end()
        )));
    }
    Ok(())
}

/// Email: non-empty, contains `@`, at least 5 characters. Not a grammar check.
pub fn email(email: &str) -> Result<()> {
    let len = require("email", email)?;
    if !email.contains('@') || len < MIN_EMAIL_LEN {
        return Err(QuotaError::InvalidEmail(format!("'{email}' is not a valid email address")));
    }
    Ok(())
}
