//! Configuration diff computation
//!
//! Compares the observed configuration of one topic with its desired
//! configuration. A desired key is set whenever its observed value differs.
//! An observed key missing from the desired set is only reverted when it is
//! an explicit override on the topic; values inherited from the broker or
//! the cluster defaults are left alone.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ConfigEntry, ConfigMutation, ConfigSource};

/// Why an observed key absent from the desired configuration was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetainReason {
    /// The entry already holds its default value
    AlreadyDefault,
    /// The entry is inherited from a non-topic source
    NotTopicOverride(ConfigSource),
}

impl fmt::Display for RetainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDefault => f.write_str("already default"),
            Self::NotTopicOverride(source) => write!(f, "inherited from {source}"),
        }
    }
}

/// Mutations for one topic, plus the observed keys deliberately left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDiff {
    /// Mutations sorted by key
    pub mutations: Vec<ConfigMutation>,
    /// Kept keys and why, sorted by key
    pub retained: Vec<(String, RetainReason)>,
}

impl ConfigDiff {
    /// Check if the configuration already matches
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Compute the mutations moving `observed` toward `desired`, sorted by key
pub fn diff(
    observed: &BTreeMap<String, ConfigEntry>,
    desired: &BTreeMap<String, String>,
) -> Vec<ConfigMutation> {
    explain(observed, desired).mutations
}

/// Like [`diff`], also reporting every observed key that was kept
pub fn explain(
    observed: &BTreeMap<String, ConfigEntry>,
    desired: &BTreeMap<String, String>,
) -> ConfigDiff {
    let mut result = ConfigDiff::default();

    for (key, value) in desired {
        let current = observed.get(key).and_then(|entry| entry.value.as_deref());
        if current != Some(value.as_str()) {
            result.mutations.push(ConfigMutation::set(key, value));
        }
    }

    for (key, entry) in observed {
        if desired.contains_key(key) {
            continue;
        }
        if entry.is_default {
            result.retained.push((key.clone(), RetainReason::AlreadyDefault));
        } else if !entry.source.is_topic_override() {
            result
                .retained
                .push((key.clone(), RetainReason::NotTopicOverride(entry.source)));
        } else {
            result.mutations.push(ConfigMutation::delete(key));
        }
    }

    result.mutations.sort_by(|a, b| a.key.cmp(&b.key));
    result
}
