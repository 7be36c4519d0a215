//! Guard configuration.
//!
//! Tier ceilings are deliberately absent: they live only in
//! [`TierLimits::for_tier`](crate::TierLimits::for_tier).

use std::path::{Path, PathBuf};

/// Environment variable naming the snapshot file.
pub const SNAPSHOT_PATH_ENV: &str = "TIERGUARD_SNAPSHOT_PATH";

/// Persistence settings for a [`QuotaGuard`](crate::QuotaGuard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Snapshot file restored on open and written on shutdown. `None` keeps
    /// state in memory only.
    pub snapshot_path: Option<PathBuf>,

    /// Write a snapshot from `shutdown()`.
    pub persist_on_shutdown: bool,

    /// Also write a snapshot after every N accepted consumptions.
    pub autosave_every: Option<u32>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self { snapshot_path: None, persist_on_shutdown: true, autosave_every: None }
    }
}

impl GuardConfig {
    /// In-memory config with no snapshot file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with `snapshot_path` taken from `TIERGUARD_SNAPSHOT_PATH` when set.
    pub fn from_env() -> Self {
        let snapshot_path = std::env::var_os(SNAPSHOT_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { snapshot_path, ..Self::default() }
    }

    /// Override the snapshot file.
    pub fn with_snapshot_path(mut self, path: impl AsRef<Path>) -> Self {
        self.snapshot_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Toggle the shutdown snapshot.
    pub fn with_persist_on_shutdown(mut self, enabled: bool) -> Self {
        self.persist_on_shutdown = enabled;
        self
    }

    /// Snapshot after every `n` accepted consumptions (`0` disables).
    pub fn with_autosave_every(mut self, n: u32) -> Self {
        self.autosave_every = (n > 0).then_some(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_memory() {
        let cfg = GuardConfig::new();
        assert!(cfg.snapshot_path.is_none());
        assert!(cfg.persist_on_shutdown);
        assert!(cfg.autosave_every.is_none());
    }

    #[test]
    fn builder_pattern() {
        let cfg = GuardConfig::new()
            .with_snapshot_path("/data/guard.json")
            .with_persist_on_shutdown(false)
            .with_autosave_every(10);
        assert_eq!(cfg.snapshot_path.as_deref(), Some(Path::new("/data/guard.json")));
        assert!(!cfg.persist_on_shutdown);
        assert_eq!(cfg.autosave_every, Some(10));
        assert_eq!(GuardConfig::new().with_autosave_every(0).autosave_every, None);
    }
}
