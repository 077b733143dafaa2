//! LRU cache for policy evaluation results
//!
//! The cache key is the fully serialized request, so a hit always returns
//! exactly what recomputation would. The evaluator's policy snapshot is
//! immutable for its lifetime, which is what makes caching sound at all.

use crate::authz::engine::PolicyDecision;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// LRU cache over complete decisions
pub struct DecisionCache {
    cache: Mutex<LruCache<String, PolicyDecision>>,
}

impl DecisionCache {
    /// Create a new decision cache with given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        DecisionCache {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a cached decision
    pub fn get(&self, key: &str) -> Option<PolicyDecision> {
        self.cache.lock().get(key).cloned()
    }

    /// Store a decision
    pub fn put(&self, key: String, decision: PolicyDecision) {
        self.cache.lock().put(key, decision);
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached decisions
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::policy::Effect;

    fn decision(reason: &str) -> PolicyDecision {
        PolicyDecision {
            decision: Effect::Allow,
            reason: reason.to_string(),
            applied_policies: Vec::new(),
            request_id: None,
        }
    }

    #[test]
    fn test_cache_basic() {
        let cache = DecisionCache::new(10);

        assert!(cache.get("k1").is_none());
        cache.put("k1".to_string(), decision("first"));
        assert_eq!(cache.get("k1").unwrap().reason, "first");
    }

    #[test]
    fn test_cache_lru_eviction() {
        let cache = DecisionCache::new(2);

        cache.put("a".to_string(), decision("a"));
        cache.put("b".to_string(), decision("b"));
        cache.put("c".to_string(), decision("c")); // evicts a

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_clear() {
        let cache = DecisionCache::new(10);
        cache.put("a".to_string(), decision("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
