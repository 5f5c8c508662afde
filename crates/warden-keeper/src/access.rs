//! Per-chain origin allow-lists
//!
//! Fails closed: a chain without an entry admits nobody but the internal
//! origin, which is the keeper's own approval UI and passes on every chain.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    internal_origin: String,
    origins: HashMap<String, Vec<String>>,
}

impl AccessPolicy {
    pub fn new(internal_origin: impl Into<String>) -> Self {
        Self {
            internal_origin: internal_origin.into(),
            origins: HashMap::new(),
        }
    }

    /// Admit `origin` on `chain_id`.
    pub fn allow(mut self, chain_id: impl Into<String>, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        let allowed = self.origins.entry(chain_id.into()).or_default();
        if !allowed.contains(&origin) {
            allowed.push(origin);
        }
        self
    }

    pub fn is_internal(&self, origin: &str) -> bool {
        origin == self.internal_origin
    }

    /// Exact string match; no normalization of scheme, case or trailing slash.
    pub fn is_allowed(&self, chain_id: &str, origin: &str) -> bool {
        self.is_internal(origin)
            || self
                .origins
                .get(chain_id)
                .map(|allowed| allowed.iter().any(|o| o == origin))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::new("warden://ui")
            .allow("cosmoshub-2", "http://localhost:8081")
            .allow("cosmoshub-2", "http://localhost:8081")
            .allow("columbus-2", "https://station.example")
    }

    #[test]
    fn test_allowed_origin() {
        let p = policy();
        assert!(p.is_allowed("cosmoshub-2", "http://localhost:8081"));
        assert_eq!(p.origins["cosmoshub-2"].len(), 1);
    }

    #[test]
    fn test_origin_is_per_chain() {
        let p = policy();
        assert!(!p.is_allowed("columbus-2", "http://localhost:8081"));
        assert!(!p.is_allowed("cosmoshub-2", "https://station.example"));
    }

    #[test]
    fn test_unknown_chain_fails_closed() {
        let p = policy();
        assert!(!p.is_allowed("unknown-1", "http://localhost:8081"));
        assert!(!p.origins.contains_key("unknown-1"));
    }

    #[test]
    fn test_no_normalization() {
        let p = policy();
        assert!(!p.is_allowed("cosmoshub-2", "http://localhost:8081/"));
        assert!(!p.is_allowed("cosmoshub-2", "HTTP://localhost:8081"));
    }

    #[test]
    fn test_internal_origin_allowed_everywhere() {
        let p = policy();
        assert!(p.is_internal("warden://ui"));
        assert!(p.is_allowed("cosmoshub-2", "warden://ui"));
        assert!(p.is_allowed("unknown-1", "warden://ui"));
        assert!(!p.is_allowed("cosmoshub-2", "warden://ui/"));
    }
}
