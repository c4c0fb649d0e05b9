//! # Declarative
//!
//! Declarative topic management.
//!
//! This crate compares topic definitions (the desired state) with what a
//! cluster reports (the observed state) and converges the cluster through
//! a small set of administrative operations.
//!
//! ## Core Concepts
//!
//! - **TopicDefinition**: desired partitions, replication factor and config of one topic
//! - **Snapshot**: observed topics, internal ones excluded
//! - **Plan**: topics to create, reconfigure, grow and delete
//! - **Executor**: fetches the snapshot and applies the plan stage by stage
//!
//! ## Stages
//!
//! Stages always run in the same order: create, reconfigure, grow
//! partitions, delete. A failing stage is recorded and the next one still
//! runs. In a dry run, creation and reconfiguration are validated by the
//! cluster without being applied, and partition growth is skipped. Deletion
//! only happens when explicitly enabled.
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, TopicDefinition, execute_simple};
//! use std::collections::BTreeMap;
//!
//! let desired = BTreeMap::from([("orders".to_string(), TopicDefinition::default())]);
//! let summary = execute_simple(&admin, &desired, &ExecuteOptions::default()).await?;
//! println!("{} change(s) applied", summary.total_changes());
//! ```
//!
//! ## Provider Traits
//!
//! - [`ClusterAdmin`]: administrative access to the cluster
//! - [`ProgressCallback`]: receives progress updates
//!
//! This allows the crate to be used without hard dependencies on a
//! specific cluster client or UI framework.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod types;

// Re-export main types at crate root
pub use context::{ClusterAdmin, NoProgress, ProgressCallback};
pub use diff::{ConfigDiff, RetainReason, diff, explain};
pub use error::GatewayError;
pub use executor::{apply_plan, execute, execute_simple, fetch_snapshot};
pub use planner::{Plan, PlanNote};
pub use types::{
    ConfigEntry, ConfigMutation, ConfigSource, ExecuteOptions, ExecuteSummary, MutationKind,
    NewTopic, ObservedTopic, PartitionGrowth, Snapshot, Stage, StageOutcome, TopicDefinition,
    TopicDescription,
};
