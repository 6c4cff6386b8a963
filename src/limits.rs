//! Resolution limits
//!
//! The depth bound is the only limit on resolution work: a reference cycle
//! is reported once traversal reaches `max_depth`.

use std::env;

/// Default traversal depth at which a cycle is reported
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Environment variable overriding [`ResolveLimits::max_depth`]
pub const MAX_DEPTH_ENV: &str = "REPORTDEPS_MAX_DEPTH";

/// Limits applied to a single resolution call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveLimits {
    /// Depth at which traversal fails with a cycle error
    pub max_depth: usize,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolveLimits {
    /// Create limits suitable for testing (fails fast on cycles)
    pub fn testing() -> Self {
        Self { max_depth: 8 }
    }

    /// Defaults, with `REPORTDEPS_MAX_DEPTH` applied when set to a positive integer
    pub fn from_env() -> Self {
        let mut limits = Self::default();
        if let Ok(raw) = env::var(MAX_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => limits.max_depth = depth,
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {}, using default {}",
                    MAX_DEPTH_ENV,
                    DEFAULT_MAX_DEPTH
                ),
            }
        }
        limits
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_depth_is_100() {
        assert_eq!(ResolveLimits::default().max_depth, 100);
    }

    #[test]
    fn testing_limits_are_tighter() {
        assert!(ResolveLimits::testing().max_depth < DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn with_max_depth_overrides() {
        assert_eq!(ResolveLimits::default().with_max_depth(3).max_depth, 3);
    }
}
