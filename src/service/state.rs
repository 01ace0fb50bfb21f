//! Service state management.
//!
//! Holds the store, the analyzer bound to it, and the ingestion job
//! registry. Everything is behind `Arc`, so cloning the state is cheap and
//! every handler sees the same registry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analyzer::TemporalAnalyzer;
use crate::ingest::{IngestionJobRegistry, DEFAULT_JOB_CAPACITY};
use crate::policy::AnalysisPolicy;
use crate::store::EventWriter;

/// Hash-stable reference to the active policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyRef {
    /// Policy type identifier (e.g., "analysis_policy_v1")
    pub policy_id: String,
    /// xxHash64 of the quantized result-affecting parameters
    pub params_hash: String,
}

impl PolicyRef {
    /// Create a policy reference from a policy.
    pub fn from_policy(policy: &AnalysisPolicy) -> Self {
        Self {
            policy_id: policy.policy_id().to_string(),
            params_hash: policy.params_hash(),
        }
    }
}

/// Shared service state.
pub struct ServiceState<S: EventWriter + 'static> {
    /// The event store.
    pub store: Arc<S>,
    /// Analyzer over `store`.
    pub analyzer: Arc<TemporalAnalyzer<S>>,
    /// Ingestion jobs.
    pub jobs: Arc<IngestionJobRegistry>,
    policy_ref: PolicyRef,
}

impl<S: EventWriter + 'static> ServiceState<S> {
    /// Create service state with an explicit policy and job capacity.
    pub fn new(store: S, policy: AnalysisPolicy, job_capacity: usize) -> Self {
        let store = Arc::new(store);
        let policy_ref = PolicyRef::from_policy(&policy);
        Self {
            analyzer: Arc::new(TemporalAnalyzer::new(Arc::clone(&store), policy)),
            store,
            jobs: Arc::new(IngestionJobRegistry::new(job_capacity)),
            policy_ref,
        }
    }

    /// Create service state from environment variables.
    ///
    /// Reads the policy via [`AnalysisPolicy::from_env`] and the job registry
    /// capacity from `INGEST_JOB_CAPACITY`.
    pub fn from_env(store: S) -> Self {
        let job_capacity = std::env::var("INGEST_JOB_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_JOB_CAPACITY);
        Self::new(store, AnalysisPolicy::from_env(), job_capacity)
    }

    /// Reference to the active policy.
    pub fn policy_ref(&self) -> &PolicyRef {
        &self.policy_ref
    }
}

impl<S: EventWriter + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            analyzer: Arc::clone(&self.analyzer),
            jobs: Arc::clone(&self.jobs),
            policy_ref: self.policy_ref.clone(),
        }
    }
}
