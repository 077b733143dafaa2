//! Policy persistence seam
//!
//! The lifecycle wrappers talk to live policies through [`PolicyStore`], so
//! the host system can back them with whatever persistence it owns. The
//! in-memory implementation is the default for tests and the mock-backed
//! console; it holds plain value snapshots and never hands out shared
//! mutable state.

use crate::authz::{Policy, PolicyStatus};
use crate::error::Result;
use ahash::AHashMap;
use parking_lot::RwLock;

/// Filter for policy listings
#[derive(Debug, Clone, Default)]
pub struct PolicyFilter {
    pub status: Option<PolicyStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl PolicyFilter {
    /// Only active policies
    pub fn active() -> Self {
        PolicyFilter {
            status: Some(PolicyStatus::Active),
            ..Default::default()
        }
    }

    fn accepts(&self, policy: &Policy) -> bool {
        if let Some(status) = self.status {
            if policy.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if policy.metadata.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !policy.metadata.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}

/// Live policy storage
pub trait PolicyStore: Send + Sync {
    /// Policies matching the filter, ordered by descending priority then id
    fn list(&self, filter: &PolicyFilter) -> Result<Vec<Policy>>;

    fn get(&self, id: &str) -> Result<Option<Policy>>;

    /// Insert or replace a policy
    fn put(&self, policy: Policy) -> Result<()>;

    /// Remove a policy, returning it if present
    fn remove(&self, id: &str) -> Result<Option<Policy>>;
}

/// In-memory policy store
#[derive(Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<AHashMap<String, Policy>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with an initial policy set
    pub fn with_policies(policies: Vec<Policy>) -> Self {
        let store = Self::new();
        {
            let mut map = store.policies.write();
            for policy in policies {
                map.insert(policy.id.clone(), policy);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn list(&self, filter: &PolicyFilter) -> Result<Vec<Policy>> {
        let mut out: Vec<Policy> = self
            .policies
            .read()
            .values()
            .filter(|p| filter.accepts(p))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn get(&self, id: &str) -> Result<Option<Policy>> {
        Ok(self.policies.read().get(id).cloned())
    }

    fn put(&self, policy: Policy) -> Result<()> {
        self.policies.write().insert(policy.id.clone(), policy);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<Option<Policy>> {
        Ok(self.policies.write().remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::Effect;

    #[test]
    fn test_put_get_remove() {
        let store = InMemoryPolicyStore::new();
        let policy = Policy::new("p1", "Policy one", Effect::Allow);

        store.put(policy.clone()).unwrap();
        assert_eq!(store.get("p1").unwrap().unwrap(), policy);

        let removed = store.remove("p1").unwrap().unwrap();
        assert_eq!(removed.id, "p1");
        assert!(store.get("p1").unwrap().is_none());
        assert!(store.remove("p1").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_and_orders() {
        let mut inactive = Policy::new("p-inactive", "Inactive", Effect::Allow);
        inactive.status = PolicyStatus::Inactive;

        let store = InMemoryPolicyStore::with_policies(vec![
            Policy::new("p-low", "Low", Effect::Allow).with_priority(10),
            Policy::new("p-high", "High", Effect::Deny).with_priority(200),
            inactive,
        ]);

        let all = store.list(&PolicyFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, "p-high");

        let active = store.list(&PolicyFilter::active()).unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|p| p.status == PolicyStatus::Active));
    }

    #[test]
    fn test_list_by_tag() {
        let mut tagged = Policy::new("p-tagged", "Tagged", Effect::Allow);
        tagged.metadata.tags = vec!["pci".to_string()];

        let store = InMemoryPolicyStore::with_policies(vec![
            tagged,
            Policy::new("p-plain", "Plain", Effect::Allow),
        ]);

        let filter = PolicyFilter {
            tag: Some("pci".to_string()),
            ..Default::default()
        };
        let hits = store.list(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p-tagged");
    }
}
