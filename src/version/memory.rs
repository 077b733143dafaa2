//! In-memory version store
//!
//! Chains are kept per policy id behind an outer read-favoring map lock;
//! each chain carries its own mutex, so concurrent appends to the same
//! policy serialize (number assignment + append is one critical section)
//! while appends to different policies proceed in parallel.

use crate::authz::Policy;
use crate::error::Result;
use crate::version::{ChangeType, HistoryOrder, PolicyVersion, VersionMetadata, VersionStore};
use ahash::AHashMap;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

type Chain = Arc<Mutex<Vec<PolicyVersion>>>;

/// In-memory append-only version store
#[derive(Default)]
pub struct InMemoryVersionStore {
    chains: RwLock<AHashMap<String, Chain>>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of policies with at least one version
    pub fn policy_count(&self) -> usize {
        self.chains.read().len()
    }

    fn chain(&self, policy_id: &str) -> Chain {
        if let Some(chain) = self.chains.read().get(policy_id) {
            return Arc::clone(chain);
        }
        let mut chains = self.chains.write();
        // Another writer may have inserted between the locks
        Arc::clone(
            chains
                .entry(policy_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Vec::new()))),
        )
    }
}

impl VersionStore for InMemoryVersionStore {
    fn create_version(
        &self,
        policy_id: &str,
        mut snapshot: Policy,
        change_summary: &str,
        change_type: ChangeType,
        created_by: &str,
        metadata: VersionMetadata,
    ) -> Result<PolicyVersion> {
        let chain = self.chain(policy_id);
        let mut log = chain.lock();

        let version = log.len() as u32 + 1;
        snapshot.version = version;

        let record = PolicyVersion {
            id: format!("{policy_id}-v{version}"),
            policy_id: policy_id.to_string(),
            version,
            content: snapshot,
            change_summary: change_summary.to_string(),
            change_type,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
            metadata,
        };
        log.push(record.clone());

        debug!(policy = policy_id, version, ?change_type, "version appended");
        Ok(record)
    }

    fn history(&self, policy_id: &str, order: HistoryOrder) -> Vec<PolicyVersion> {
        let chain = match self.chains.read().get(policy_id) {
            Some(chain) => Arc::clone(chain),
            None => return Vec::new(),
        };
        let log = chain.lock();
        match order {
            HistoryOrder::OldestFirst => log.clone(),
            HistoryOrder::NewestFirst => log.iter().rev().cloned().collect(),
        }
    }

    fn version(&self, policy_id: &str, version: u32) -> Option<PolicyVersion> {
        if version == 0 {
            return None;
        }
        let chain = {
            let chains = self.chains.read();
            Arc::clone(chains.get(policy_id)?)
        };
        let log = chain.lock();
        // Chains are gap-free from 1, so the index is the version
        log.get(version as usize - 1).cloned()
    }
}
