//! Reconciliation planner - computes the actions converging the cluster

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::{RetainReason, explain};
use crate::types::{ConfigMutation, NewTopic, PartitionGrowth, Snapshot, Stage, TopicDefinition};

/// Diagnostic recorded while planning. Notes never change the actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanNote {
    /// Fewer partitions were requested than the topic has
    ShrinkIgnored {
        topic: String,
        current: i32,
        desired: i32,
    },
    /// An observed key absent from the definition was kept
    ConfigRetained {
        topic: String,
        key: String,
        reason: RetainReason,
    },
    /// The requested replication factor differs from the observed one
    ReplicationDrift {
        topic: String,
        current: i32,
        desired: i32,
    },
}

impl fmt::Display for PlanNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShrinkIgnored {
                topic,
                current,
                desired,
            } => write!(
                f,
                "{topic}: partition count {current} kept, cannot shrink to {desired}"
            ),
            Self::ConfigRetained { topic, key, reason } => {
                write!(f, "{topic}: {key} kept ({reason})")
            }
            Self::ReplicationDrift {
                topic,
                current,
                desired,
            } => write!(
                f,
                "{topic}: replication factor is {current}, definition asks for {desired} (not changed)"
            ),
        }
    }
}

/// Actions needed to converge the cluster toward the definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Topics to create, sorted by name
    pub to_create: Vec<NewTopic>,
    /// Config mutations per existing topic (never empty lists)
    pub to_reconfigure: BTreeMap<String, Vec<ConfigMutation>>,
    /// Partition increases per existing topic
    pub to_grow: BTreeMap<String, PartitionGrowth>,
    /// Existing topics with no definition
    pub to_delete: BTreeSet<String>,
    /// Diagnostics
    pub notes: Vec<PlanNote>,
}

impl Plan {
    /// Compute the plan for a snapshot and a set of definitions
    pub fn build(snapshot: &Snapshot, desired: &BTreeMap<String, TopicDefinition>) -> Self {
        let mut plan = Self::default();

        for (name, definition) in desired {
            let Some(observed) = snapshot.get(name) else {
                plan.to_create.push(NewTopic::from_definition(name, definition));
                continue;
            };

            let config = explain(&observed.config, &definition.config);
            for (key, reason) in config.retained {
                plan.notes.push(PlanNote::ConfigRetained {
                    topic: name.clone(),
                    key,
                    reason,
                });
            }
            if !config.mutations.is_empty() {
                plan.to_reconfigure.insert(name.clone(), config.mutations);
            }

            if definition.partitions > observed.partitions {
                plan.to_grow.insert(
                    name.clone(),
                    PartitionGrowth {
                        current: observed.partitions,
                        target: definition.partitions,
                    },
                );
            } else if definition.partitions < observed.partitions {
                plan.notes.push(PlanNote::ShrinkIgnored {
                    topic: name.clone(),
                    current: observed.partitions,
                    desired: definition.partitions,
                });
            }

            if observed.replication > 0 && definition.replication != observed.replication {
                plan.notes.push(PlanNote::ReplicationDrift {
                    topic: name.clone(),
                    current: observed.replication,
                    desired: definition.replication,
                });
            }
        }

        plan.to_delete = snapshot
            .keys()
            .filter(|name| !desired.contains_key(*name))
            .cloned()
            .collect();

        plan
    }

    /// Check if the cluster already matches
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty()
            && self.to_reconfigure.is_empty()
            && self.to_grow.is_empty()
            && self.to_delete.is_empty()
    }

    /// Number of actions in one stage
    pub fn stage_len(&self, stage: Stage) -> usize {
        match stage {
            Stage::Create => self.to_create.len(),
            Stage::Reconfigure => self.to_reconfigure.len(),
            Stage::GrowPartitions => self.to_grow.len(),
            Stage::Delete => self.to_delete.len(),
        }
    }

    /// Total number of actions
    pub fn total(&self) -> usize {
        Stage::ALL.iter().map(|stage| self.stage_len(*stage)).sum()
    }

    /// Target partition counts for the grow stage
    pub fn grow_targets(&self) -> BTreeMap<String, i32> {
        self.to_grow
            .iter()
            .map(|(name, growth)| (name.clone(), growth.target))
            .collect()
    }
}
