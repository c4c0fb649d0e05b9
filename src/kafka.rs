//! Kafka admin gateway backed by librdkafka

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::admin::{
    AdminClient, AdminOptions, AlterConfig, NewPartitions, NewTopic as KafkaNewTopic,
    ResourceSpecifier, TopicReplication, TopicResult,
};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::KafkaError;
use rdkafka::metadata::Metadata;

use declarative::{
    ClusterAdmin, ConfigEntry, ConfigMutation, ConfigSource, GatewayError, MutationKind, NewTopic,
    TopicDescription,
};

use crate::config::ClientSettings;

/// [`ClusterAdmin`] implementation on top of an rdkafka admin client
pub struct KafkaAdmin {
    client: Arc<AdminClient<DefaultClientContext>>,
    timeout: Duration,
}

impl KafkaAdmin {
    /// Create an admin client from the collected client settings
    ///
    /// `timeout` bounds metadata requests and is sent as the request
    /// timeout of every admin call.
    pub fn connect(settings: &ClientSettings, timeout: Duration) -> Result<Self> {
        let mut config = ClientConfig::new();
        for (key, value) in settings.iter() {
            config.set(key, value);
        }
        let client = config
            .create()
            .context("Failed to create Kafka admin client")?;
        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    fn options(&self, validate_only: bool) -> AdminOptions {
        AdminOptions::new()
            .request_timeout(Some(self.timeout))
            .validate_only(validate_only)
    }

    /// Fetch cluster metadata on a blocking thread
    async fn metadata(&self, operation: &'static str) -> Result<Metadata, GatewayError> {
        let client = Arc::clone(&self.client);
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || client.inner().fetch_metadata(None, timeout))
            .await
            .map_err(|e| GatewayError::call(operation, e.to_string()))?
            .map_err(|e| kafka_error(operation, &e))
    }

    /// Current explicit overrides of one topic
    async fn topic_overrides(&self, topic: &str) -> Result<BTreeMap<String, String>, GatewayError> {
        let names = BTreeSet::from([topic.to_string()]);
        let mut configs = self.describe_configs(&names).await?;
        Ok(configs
            .remove(topic)
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.source.is_topic_override() && !entry.is_default)
            // Sensitive values come back hidden and cannot be re-sent
            .filter_map(|entry| entry.value.map(|value| (entry.name, value)))
            .collect())
    }
}

fn kafka_error(operation: &'static str, error: &KafkaError) -> GatewayError {
    GatewayError::call(operation, error.to_string())
}

/// Fold per-topic results into one error naming every failed topic
fn check_results(operation: &'static str, results: Vec<TopicResult>) -> Result<(), GatewayError> {
    let failures: Vec<String> = results
        .into_iter()
        .filter_map(Result::err)
        .map(|(topic, code)| format!("{topic}: {code}"))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::call(operation, failures.join(", ")))
    }
}

fn convert_source(source: rdkafka::admin::ConfigSource) -> ConfigSource {
    use rdkafka::admin::ConfigSource as Kafka;
    match source {
        Kafka::DynamicTopic => ConfigSource::DynamicTopic,
        Kafka::DynamicBroker => ConfigSource::DynamicBroker,
        Kafka::DynamicDefaultBroker => ConfigSource::DynamicDefaultBroker,
        Kafka::StaticBroker => ConfigSource::StaticBroker,
        Kafka::Default => ConfigSource::Default,
        Kafka::Unknown => ConfigSource::Unknown,
    }
}

/// Full override set after applying `mutations` to `current`
fn apply_mutations(
    mut current: BTreeMap<String, String>,
    mutations: &[ConfigMutation],
) -> BTreeMap<String, String> {
    for mutation in mutations {
        match (mutation.kind, &mutation.value) {
            (MutationKind::Set, Some(value)) => {
                current.insert(mutation.key.clone(), value.clone());
            }
            (MutationKind::Set, None) | (MutationKind::Delete, _) => {
                current.remove(&mutation.key);
            }
        }
    }
    current
}

#[async_trait]
impl ClusterAdmin for KafkaAdmin {
    async fn list_topics(&self) -> Result<BTreeSet<String>, GatewayError> {
        let metadata = self.metadata("list_topics").await?;
        Ok(metadata
            .topics()
            .iter()
            .map(|topic| topic.name().to_string())
            .collect())
    }

    async fn describe_topics(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, TopicDescription>, GatewayError> {
        let metadata = self.metadata("describe_topics").await?;
        let mut descriptions = BTreeMap::new();
        for topic in metadata.topics() {
            if !names.contains(topic.name()) {
                continue;
            }
            if let Some(err) = topic.error() {
                return Err(GatewayError::call(
                    "describe_topics",
                    format!("{}: {err:?}", topic.name()),
                ));
            }
            let partitions = topic.partitions();
            descriptions.insert(
                topic.name().to_string(),
                TopicDescription {
                    partitions: partitions.len() as i32,
                    replication: partitions
                        .first()
                        .map_or(0, |partition| partition.replicas().len() as i32),
                },
            );
        }
        Ok(descriptions)
    }

    async fn describe_configs(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Vec<ConfigEntry>>, GatewayError> {
        let specifiers: Vec<_> = names
            .iter()
            .map(|name| ResourceSpecifier::Topic(name))
            .collect();
        let results = self
            .client
            .describe_configs(&specifiers, &self.options(false))
            .await
            .map_err(|e| kafka_error("describe_configs", &e))?;

        let mut configs = BTreeMap::new();
        let mut failures = Vec::new();
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(resource) => {
                    let entries = resource
                        .entries
                        .into_iter()
                        .map(|entry| ConfigEntry {
                            value: if entry.is_sensitive { None } else { entry.value },
                            name: entry.name,
                            is_default: entry.is_default,
                            source: convert_source(entry.source),
                        })
                        .collect();
                    configs.insert(name.clone(), entries);
                }
                Err(code) => failures.push(format!("{name}: {code}")),
            }
        }

        if failures.is_empty() {
            Ok(configs)
        } else {
            Err(GatewayError::call("describe_configs", failures.join(", ")))
        }
    }

    async fn create_topics(
        &self,
        topics: &[NewTopic],
        validate_only: bool,
    ) -> Result<(), GatewayError> {
        let new_topics: Vec<KafkaNewTopic<'_>> = topics
            .iter()
            .map(|topic| {
                topic.config.iter().fold(
                    KafkaNewTopic::new(
                        &topic.name,
                        topic.partitions,
                        TopicReplication::Fixed(topic.replication),
                    ),
                    |new_topic, (key, value)| new_topic.set(key, value),
                )
            })
            .collect();

        let results = self
            .client
            .create_topics(&new_topics, &self.options(validate_only))
            .await
            .map_err(|e| kafka_error("create_topics", &e))?;
        check_results("create_topics", results)
    }

    async fn alter_configs(
        &self,
        changes: &BTreeMap<String, Vec<ConfigMutation>>,
        validate_only: bool,
    ) -> Result<(), GatewayError> {
        // The non-incremental API replaces every override, so send the full set
        let mut targets = BTreeMap::new();
        for (topic, mutations) in changes {
            let current = self.topic_overrides(topic).await?;
            targets.insert(topic.as_str(), apply_mutations(current, mutations));
        }

        let alters: Vec<AlterConfig<'_>> = targets
            .iter()
            .map(|(topic, overrides)| {
                overrides.iter().fold(
                    AlterConfig::new(ResourceSpecifier::Topic(topic)),
                    |alter, (key, value)| alter.set(key, value),
                )
            })
            .collect();

        let results = self
            .client
            .alter_configs(&alters, &self.options(validate_only))
            .await
            .map_err(|e| kafka_error("alter_configs", &e))?;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|(resource, code)| format!("{resource:?}: {code}"))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::call("alter_configs", failures.join(", ")))
        }
    }

    async fn create_partitions(
        &self,
        targets: &BTreeMap<String, i32>,
    ) -> Result<(), GatewayError> {
        let partitions: Vec<NewPartitions<'_>> = targets
            .iter()
            .map(|(topic, count)| NewPartitions::new(topic, *count as usize))
            .collect();
        let results = self
            .client
            .create_partitions(&partitions, &self.options(false))
            .await
            .map_err(|e| kafka_error("create_partitions", &e))?;
        check_results("create_partitions", results)
    }

    async fn delete_topics(&self, names: &BTreeSet<String>) -> Result<(), GatewayError> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let results = self
            .client
            .delete_topics(&names, &self.options(false))
            .await
            .map_err(|e| kafka_error("delete_topics", &e))?;
        check_results("delete_topics", results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mutations_rebuilds_override_set() {
        let current = BTreeMap::from([
            ("retention.ms".to_string(), "1000".to_string()),
            ("segment.ms".to_string(), "60000".to_string()),
        ]);
        let result = apply_mutations(
            current,
            &[
                ConfigMutation::set("retention.ms", "2000"),
                ConfigMutation::delete("segment.ms"),
                ConfigMutation::set("cleanup.policy", "compact"),
            ],
        );
        assert_eq!(
            result,
            BTreeMap::from([
                ("cleanup.policy".to_string(), "compact".to_string()),
                ("retention.ms".to_string(), "2000".to_string()),
            ])
        );
    }

    #[test]
    fn test_check_results_joins_failures() {
        use rdkafka::types::RDKafkaErrorCode;

        let results: Vec<TopicResult> = vec![
            Ok("orders".to_string()),
            Err(("events".to_string(), RDKafkaErrorCode::TopicAlreadyExists)),
        ];
        let err = check_results("create_topics", results).unwrap_err();
        assert!(err.to_string().starts_with("create_topics failed: events:"));
    }
}
