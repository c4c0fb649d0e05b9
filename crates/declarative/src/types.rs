//! Core types for declarative topic management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Desired state of one topic
///
/// The topic name is the key of the map holding the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDefinition {
    pub partitions: i32,
    pub replication: i32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl Default for TopicDefinition {
    fn default() -> Self {
        Self {
            partitions: 1,
            replication: 1,
            config: BTreeMap::new(),
        }
    }
}

/// Where the cluster says a configuration value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Explicit override set on this topic
    DynamicTopic,
    /// Dynamic override on one broker
    DynamicBroker,
    /// Dynamic cluster-wide broker default
    DynamicDefaultBroker,
    /// Static broker configuration (server.properties)
    StaticBroker,
    /// Built-in default
    Default,
    /// Source not reported
    Unknown,
}

impl ConfigSource {
    /// Whether the value is an override set at the topic level
    pub fn is_topic_override(&self) -> bool {
        matches!(self, Self::DynamicTopic)
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DynamicTopic => "dynamic topic config",
            Self::DynamicBroker => "dynamic broker config",
            Self::DynamicDefaultBroker => "dynamic default broker config",
            Self::StaticBroker => "static broker config",
            Self::Default => "default config",
            Self::Unknown => "unknown source",
        };
        f.write_str(name)
    }
}

/// One observed configuration entry of a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub name: String,
    /// `None` for sensitive or unset values
    pub value: Option<String>,
    pub is_default: bool,
    pub source: ConfigSource,
}

impl ConfigEntry {
    /// An explicit override set on the topic
    pub fn topic_override(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            is_default: false,
            source: ConfigSource::DynamicTopic,
        }
    }

    /// A value inherited from the cluster defaults
    pub fn default_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            is_default: true,
            source: ConfigSource::Default,
        }
    }
}

/// Partition and replica layout of a topic as reported by the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescription {
    pub partitions: i32,
    /// Replica count of the first partition, 0 when unknown
    pub replication: i32,
}

/// Current cluster state of one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTopic {
    pub name: String,
    pub partitions: i32,
    pub replication: i32,
    /// Configuration entries keyed by name
    pub config: BTreeMap<String, ConfigEntry>,
}

impl ObservedTopic {
    /// Build an observed topic from its description and config entries
    pub fn new(name: impl Into<String>, description: TopicDescription, entries: Vec<ConfigEntry>) -> Self {
        Self {
            name: name.into(),
            partitions: description.partitions,
            replication: description.replication,
            config: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }
}

/// Observed topics by name, internal topics excluded
pub type Snapshot = BTreeMap<String, ObservedTopic>;

/// Kind of configuration change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MutationKind {
    /// Set the key to a value
    Set,
    /// Remove the topic override, reverting to the inherited default
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => f.write_str("SET"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

/// One configuration change on one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMutation {
    pub key: String,
    /// Always `Some` for [`MutationKind::Set`], always `None` for [`MutationKind::Delete`]
    pub value: Option<String>,
    pub kind: MutationKind,
}

impl ConfigMutation {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            kind: MutationKind::Set,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            kind: MutationKind::Delete,
        }
    }
}

impl fmt::Display for ConfigMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {} ({})", self.key, value, self.kind),
            None => write!(f, "{}: ({})", self.key, self.kind),
        }
    }
}

/// A topic to create, carrying its full desired configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTopic {
    pub name: String,
    pub partitions: i32,
    pub replication: i32,
    pub config: BTreeMap<String, String>,
}

impl NewTopic {
    pub fn from_definition(name: impl Into<String>, definition: &TopicDefinition) -> Self {
        Self {
            name: name.into(),
            partitions: definition.partitions,
            replication: definition.replication,
            config: definition.config.clone(),
        }
    }
}

/// Partition count increase for an existing topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionGrowth {
    pub current: i32,
    pub target: i32,
}

impl fmt::Display for PartitionGrowth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.current, self.target)
    }
}

/// Execution stages, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Create,
    Reconfigure,
    GrowPartitions,
    Delete,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 4] = [
        Stage::Create,
        Stage::Reconfigure,
        Stage::GrowPartitions,
        Stage::Delete,
    ];

    /// Section title used when reporting the stage
    pub fn title(&self) -> &'static str {
        match self {
            Self::Create => "TOPICS TO CREATE",
            Self::Reconfigure => "TOPICS TO UPDATE",
            Self::GrowPartitions => "PARTITION COUNTS TO INCREASE",
            Self::Delete => "TOPICS TO DELETE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Reconfigure => "reconfigure",
            Self::GrowPartitions => "grow partitions",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of running one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    /// Nothing to do
    NoChange,
    /// Changes were applied to the cluster
    Applied { count: usize },
    /// Changes were only validated by the cluster (dry run)
    Validated { count: usize },
    /// Stage was not executed
    Skipped { reason: String },
    /// The gateway call failed
    Failed { error: String },
}

impl StageOutcome {
    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => f.write_str("no changes"),
            Self::Applied { count } => write!(f, "{count} applied"),
            Self::Validated { count } => write!(f, "{count} validated"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Summary of execution results, one outcome per stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub stages: Vec<(Stage, StageOutcome)>,
}

impl ExecuteSummary {
    /// Record the outcome of a stage
    pub fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push((stage, outcome));
    }

    /// Outcome of a stage, if it ran
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    /// Number of failed stages
    pub fn failed(&self) -> usize {
        self.stages
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .count()
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Total number of changes applied to the cluster
    pub fn total_changes(&self) -> usize {
        self.stages
            .iter()
            .map(|(_, outcome)| match outcome {
                StageOutcome::Applied { count } => *count,
                _ => 0,
            })
            .sum()
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Validate create/update against the cluster and skip partition growth
    pub dry_run: bool,
    /// Delete topics missing from the definitions
    pub remove_topics: bool,
    /// Deadline applied to every gateway call
    pub timeout: Duration,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            remove_topics: false,
            timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_display() {
        assert_eq!(
            ConfigMutation::set("retention.ms", "2000").to_string(),
            "retention.ms: 2000 (SET)"
        );
        assert_eq!(
            ConfigMutation::delete("cleanup.policy").to_string(),
            "cleanup.policy: (DELETE)"
        );
    }

    #[test]
    fn test_observed_topic_keys_entries_by_name() {
        let topic = ObservedTopic::new(
            "orders",
            TopicDescription {
                partitions: 3,
                replication: 2,
            },
            vec![
                ConfigEntry::topic_override("retention.ms", "1000"),
                ConfigEntry::default_value("cleanup.policy", "delete"),
            ],
        );
        assert_eq!(topic.partitions, 3);
        assert!(topic.config["retention.ms"].source.is_topic_override());
        assert!(topic.config["cleanup.policy"].is_default);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        summary.record(Stage::Create, StageOutcome::Applied { count: 2 });
        summary.record(
            Stage::Reconfigure,
            StageOutcome::Failed {
                error: "timed out".into(),
            },
        );
        summary.record(Stage::GrowPartitions, StageOutcome::NoChange);
        summary.record(
            Stage::Delete,
            StageOutcome::Skipped {
                reason: "disabled".into(),
            },
        );

        assert_eq!(summary.total_changes(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
        assert_eq!(
            summary.outcome(Stage::GrowPartitions),
            Some(&StageOutcome::NoChange)
        );
    }
}
