//! Per-domain TTL policy
//!
//! Known domains get a configured TTL; unknown keys fall back to a default.

use std::collections::HashMap;
use std::time::Duration;

/// TTL table with a default fallback for unknown keys.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    default: Duration,
    overrides: HashMap<String, Duration>,
}

impl TtlPolicy {
    /// Create a policy with the given default TTL and no overrides.
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Add a per-key TTL override.
    pub fn with_override(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.overrides.insert(key.into(), ttl);
        self
    }

    /// Build a policy from millisecond values (config representation).
    pub fn from_millis(default_ms: u64, overrides_ms: &HashMap<String, u64>) -> Self {
        let mut policy = Self::new(Duration::from_millis(default_ms));
        for (key, ms) in overrides_ms {
            policy
                .overrides
                .insert(key.clone(), Duration::from_millis(*ms));
        }
        policy
    }

    /// TTL for a key: its override, or the default.
    pub fn ttl(&self, key: &str) -> Duration {
        self.overrides.get(key).copied().unwrap_or(self.default)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(30_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fallback() {
        let policy = TtlPolicy::new(Duration::from_secs(30));
        assert_eq!(policy.ttl("anything"), Duration::from_secs(30));
    }

    #[test]
    fn test_override_wins() {
        let policy = TtlPolicy::new(Duration::from_secs(30))
            .with_override("rules", Duration::from_secs(300));
        assert_eq!(policy.ttl("rules"), Duration::from_secs(300));
        assert_eq!(policy.ttl("raffles"), Duration::from_secs(30));
    }

    #[test]
    fn test_from_millis() {
        let mut overrides = HashMap::new();
        overrides.insert("rules".to_string(), 300_000u64);
        let policy = TtlPolicy::from_millis(30_000, &overrides);
        assert_eq!(policy.ttl("rules"), Duration::from_millis(300_000));
        assert_eq!(policy.ttl("raffles"), Duration::from_millis(30_000));
    }
}
