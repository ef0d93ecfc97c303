//! Configuration for the garbage collector and ref locking, following the
//! plain serde-derived-struct-with-`Default` pattern used elsewhere in this
//! crate's ambient stack.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcConfig {
    /// Minimum age, in milliseconds, before an unreferenced object may be
    /// reclaimed.
    pub grace_period_ms: u64,
    /// Upper bound on objects deleted in a single run; `None` is unbounded.
    pub deletion_cap: Option<usize>,
    /// Classify without deleting.
    pub dry_run: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            grace_period_ms: Duration::from_secs(2 * 60 * 60).as_millis() as u64,
            deletion_cap: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefLockConfig {
    /// How long `acquire_lock` waits before failing `Locked`.
    pub acquire_timeout_ms: u64,
    /// Maximum symbolic-ref chain depth before `MaxDepthExceeded`.
    pub max_symbolic_depth: usize,
}

impl Default for RefLockConfig {
    fn default() -> Self {
        RefLockConfig {
            acquire_timeout_ms: 5_000,
            max_symbolic_depth: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gc_config_default_has_no_cap_and_is_not_dry_run() {
        let cfg = GcConfig::default();
        assert_eq!(cfg.deletion_cap, None);
        assert!(!cfg.dry_run);
    }

    #[test]
    fn ref_lock_config_default_depth_matches_spec() {
        assert_eq!(RefLockConfig::default().max_symbolic_depth, 10);
    }
}
