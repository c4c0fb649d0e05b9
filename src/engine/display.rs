//! Plain-text rendering of snapshots, plans and definitions

use std::collections::BTreeMap;

use declarative::{Plan, Snapshot, Stage, TopicDefinition};

/// Lines describing the topics currently on the cluster
///
/// Explicit topic overrides are marked with `(*)`.
pub fn snapshot_lines(snapshot: &Snapshot) -> Vec<String> {
    let mut lines = Vec::new();
    for topic in snapshot.values() {
        lines.push(format!(
            "{} ({} partitions, replication {})",
            topic.name, topic.partitions, topic.replication
        ));
        for entry in topic.config.values() {
            let marker = if entry.source.is_topic_override() {
                " (*)"
            } else {
                ""
            };
            let value = entry.value.as_deref().unwrap_or("<hidden>");
            lines.push(format!("  {}: {}{}", entry.name, value, marker));
        }
    }
    lines
}

/// Lines describing what one stage of the plan will do
pub fn stage_lines(stage: Stage, plan: &Plan) -> Vec<String> {
    let mut lines = Vec::new();
    match stage {
        Stage::Create => {
            for topic in &plan.to_create {
                lines.push(format!(
                    "{} ({} partitions, replication {})",
                    topic.name, topic.partitions, topic.replication
                ));
                for (key, value) in &topic.config {
                    lines.push(format!("  {key}: {value}"));
                }
            }
        }
        Stage::Reconfigure => {
            for (topic, mutations) in &plan.to_reconfigure {
                lines.push(topic.clone());
                lines.extend(mutations.iter().map(|m| format!("  {m}")));
            }
        }
        Stage::GrowPartitions => {
            lines.extend(
                plan.to_grow
                    .iter()
                    .map(|(topic, growth)| format!("{topic} {growth}")),
            );
        }
        Stage::Delete => {
            lines.extend(plan.to_delete.iter().map(|topic| format!("  {topic}")));
        }
    }
    lines
}

/// Lines describing a set of merged definitions
pub fn definition_lines(topics: &BTreeMap<String, TopicDefinition>) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, definition) in topics {
        lines.push(format!(
            "{} ({} partitions, replication {})",
            name, definition.partitions, definition.replication
        ));
        for (key, value) in &definition.config {
            lines.push(format!("  {key}: {value}"));
        }
    }
    lines
}
