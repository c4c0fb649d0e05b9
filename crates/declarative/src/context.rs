//! Gateway and progress traits
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific cluster client or UI.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::planner::Plan;
use crate::types::{
    ConfigEntry, ConfigMutation, NewTopic, Snapshot, Stage, StageOutcome, TopicDescription,
};

/// Administrative access to a cluster
///
/// Every call may fail; the orchestrator wraps each one in a deadline.
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// Names of every topic, internal ones included
    async fn list_topics(&self) -> Result<BTreeSet<String>, GatewayError>;

    /// Partition and replica layout of the named topics
    async fn describe_topics(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, TopicDescription>, GatewayError>;

    /// Configuration entries of the named topics
    async fn describe_configs(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Vec<ConfigEntry>>, GatewayError>;

    /// Create topics, or only validate the request when `validate_only`
    async fn create_topics(
        &self,
        topics: &[NewTopic],
        validate_only: bool,
    ) -> Result<(), GatewayError>;

    /// Apply config mutations, or only validate them when `validate_only`
    async fn alter_configs(
        &self,
        changes: &BTreeMap<String, Vec<ConfigMutation>>,
        validate_only: bool,
    ) -> Result<(), GatewayError>;

    /// Raise partition counts to the given totals
    async fn create_partitions(&self, targets: &BTreeMap<String, i32>)
    -> Result<(), GatewayError>;

    /// Delete the named topics
    async fn delete_topics(&self, names: &BTreeSet<String>) -> Result<(), GatewayError>;
}

/// Progress callback for reconciliation runs
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called before the cluster state is fetched
    fn on_snapshot_start(&mut self) {}

    /// Called once the cluster state is known
    fn on_snapshot(&mut self, snapshot: &Snapshot);

    /// Called when the cluster state could not be fetched
    fn on_snapshot_failed(&mut self, _error: &GatewayError) {}

    /// Called once the plan is computed
    fn on_plan(&mut self, _plan: &Plan) {}

    /// Called before a stage runs, with the plan it executes
    fn on_stage_start(&mut self, stage: Stage, plan: &Plan);

    /// Called when a stage finishes
    fn on_stage_complete(&mut self, stage: Stage, outcome: &StageOutcome);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}
    fn on_stage_start(&mut self, _stage: Stage, _plan: &Plan) {}
    fn on_stage_complete(&mut self, _stage: Stage, _outcome: &StageOutcome) {}
}
