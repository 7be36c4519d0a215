//! Caller identities as delivered by the host's identity resolver.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text of the distinguished "no stable identity" value.
pub const ANONYMOUS: &str = "anonymous";

/// Opaque, provider-issued caller identifier.
///
/// Non-anonymous identities are trusted as authentic; this crate never
/// verifies them. The single value [`ANONYMOUS`] means the caller has no
/// stable identity and can only use the anonymous-token path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Wrap a provider-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The anonymous sentinel.
    pub fn anonymous() -> Self {
        Self(ANONYMOUS.to_string())
    }

    /// True for the anonymous sentinel.
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallerIdentity({})", self.0)
    }
}

impl From<&str> for CallerIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CallerIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}
