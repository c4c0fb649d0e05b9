//! Topic definition files
//!
//! A definition file holds a top-level `topics` map:
//!
//! ```yaml
//! topics:
//!   orders:
//!     partitions: 6
//!     replication: 3
//!     config:
//!       retention.ms: 604800000
//!       cleanup.policy: delete
//! ```
//!
//! The format follows the file extension (`.yml`/`.yaml`, `.toml`, `.json`).
//! Files are read concurrently; a bad file is reported and left out while
//! the others still load. When several files define the same topic, the
//! file listed last wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use declarative::TopicDefinition;
use fanout::{settle, to_btree_map};
use serde::Deserialize;
use thiserror::Error;

/// Error loading one definition file
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("could not read definition file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse definition file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid definition of topic {topic} in {}: {message}", .path.display())]
    Invalid {
        path: PathBuf,
        topic: String,
        message: String,
    },

    #[error("unsupported definition file {} (expected .yml, .yaml, .toml or .json)", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl DefinitionError {
    /// The file the error is about
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::Invalid { path, .. }
            | Self::UnsupportedFormat { path } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    #[serde(default)]
    topics: Option<BTreeMap<String, Option<RawTopic>>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTopic {
    #[serde(default = "one")]
    partitions: i64,
    #[serde(default = "one")]
    replication: i64,
    #[serde(default)]
    config: Option<BTreeMap<String, RawValue>>,
}

fn one() -> i64 {
    1
}

/// Config values may be written unquoted; they are sent as strings
///
/// Unquoted floats keep their value, not their spelling (`0.50` is sent as
/// `0.5`). Quote a value to send it verbatim.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl RawValue {
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            // Debug keeps the fraction: 1.0 stays "1.0"
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => s,
        }
    }
}

/// Definitions merged from every readable file, plus the per-file errors
#[derive(Debug, Default)]
pub struct LoadedDefinitions {
    pub topics: BTreeMap<String, TopicDefinition>,
    pub errors: Vec<DefinitionError>,
}

/// Parse the contents of one definition file
pub fn parse(path: &Path, content: &str) -> Result<BTreeMap<String, TopicDefinition>, DefinitionError> {
    let format = Format::from_path(path).ok_or_else(|| DefinitionError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let parse_error = |message: String| DefinitionError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let raw: RawFile = match format {
        // An empty YAML document is a null, not a map
        Format::Yaml if content.trim().is_empty() => RawFile::default(),
        Format::Yaml => serde_yaml::from_str::<Option<RawFile>>(content)
            .map_err(|e| parse_error(e.to_string()))?
            .unwrap_or_default(),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
    };

    raw.topics
        .unwrap_or_default()
        .into_iter()
        .map(|(name, topic)| {
            let definition = match topic {
                Some(topic) => validate(path, &name, topic)?,
                None => TopicDefinition::default(),
            };
            Ok((name, definition))
        })
        .collect()
}

fn validate(path: &Path, name: &str, raw: RawTopic) -> Result<TopicDefinition, DefinitionError> {
    let invalid = |message: String| DefinitionError::Invalid {
        path: path.to_path_buf(),
        topic: name.to_string(),
        message,
    };

    let count = |field: &str, value: i64| -> Result<i32, DefinitionError> {
        match i32::try_from(value) {
            Ok(v) if v >= 1 => Ok(v),
            _ => Err(invalid(format!("{field} must be between 1 and {}, got {value}", i32::MAX))),
        }
    };

    Ok(TopicDefinition {
        partitions: count("partitions", raw.partitions)?,
        replication: count("replication", raw.replication)?,
        config: raw
            .config
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.into_string()))
            .collect(),
    })
}

/// Read and parse one definition file
pub async fn load_file(path: &Path) -> Result<BTreeMap<String, TopicDefinition>, DefinitionError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DefinitionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let topics = parse(path, &content)?;
    log::debug!("Loaded {} topic definition(s) from {}", topics.len(), path.display());
    Ok(topics)
}

/// Load every definition file and merge them, later files winning
///
/// Empty paths are ignored. With `no_replication`, every merged definition
/// asks for a replication factor of 1.
pub async fn load(paths: &[PathBuf], no_replication: bool) -> LoadedDefinitions {
    let files = paths
        .iter()
        .filter(|path| !path.as_os_str().is_empty())
        .enumerate()
        .map(|(index, path)| async move { load_file(path).await.map(|topics| (index, topics)) });

    let settled = settle(files, to_btree_map()).await;

    let mut topics = BTreeMap::new();
    for file_topics in settled.value.into_values() {
        topics.extend(file_topics);
    }

    if no_replication {
        for definition in topics.values_mut() {
            definition.replication = 1;
        }
    }

    LoadedDefinitions {
        topics,
        errors: settled.failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_yaml_with_defaults() {
        let topics = parse(
            Path::new("topics.yml"),
            "topics:\n  orders:\n    partitions: 6\n    config:\n      retention.ms: 604800000\n      compression.type: lz4\n      preallocate: true\n  events:\n",
        )
        .unwrap();

        let orders = &topics["orders"];
        assert_eq!(orders.partitions, 6);
        assert_eq!(orders.replication, 1);
        assert_eq!(orders.config["retention.ms"], "604800000");
        assert_eq!(orders.config["compression.type"], "lz4");
        assert_eq!(orders.config["preallocate"], "true");
        assert_eq!(topics["events"], TopicDefinition::default());
    }

    #[test]
    fn test_parse_toml_and_json() {
        let toml_topics = parse(
            Path::new("topics.toml"),
            "[topics.orders]\npartitions = 3\nreplication = 2\n\n[topics.orders.config]\n\"min.insync.replicas\" = 2\n",
        )
        .unwrap();
        assert_eq!(toml_topics["orders"].replication, 2);
        assert_eq!(toml_topics["orders"].config["min.insync.replicas"], "2");

        let json_topics = parse(
            Path::new("topics.json"),
            r#"{"topics": {"orders": {"partitions": 3, "config": {"segment.ms": "60000"}}}}"#,
        )
        .unwrap();
        assert_eq!(json_topics["orders"].partitions, 3);
        assert_eq!(json_topics["orders"].config["segment.ms"], "60000");
    }

    #[test]
    fn test_missing_or_null_topics() {
        assert!(parse(Path::new("a.yml"), "").unwrap().is_empty());
        assert!(parse(Path::new("a.yml"), "topics:\n").unwrap().is_empty());
        assert!(parse(Path::new("a.json"), "{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_counts() {
        let err = parse(Path::new("a.yml"), "topics:\n  orders:\n    partitions: 0\n").unwrap_err();
        assert!(matches!(err, DefinitionError::Invalid { ref topic, .. } if topic == "orders"));
        assert!(err.to_string().contains("partitions must be between 1"));

        let err = parse(Path::new("a.yml"), "topics:\n  orders:\n    replication: -1\n").unwrap_err();
        assert!(err.to_string().contains("replication"));
    }

    #[test]
    fn test_misspelled_fields_are_rejected() {
        let err = parse(
            Path::new("t.yml"),
            "topics:\n  orders:\n    partition: 12\n    replicaton: 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
        assert!(err.to_string().contains("partition"));

        let err = parse(Path::new("t.yml"), "topic:\n  orders: {}\n").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));

        let err = parse(
            Path::new("t.json"),
            r#"{"topics": {"orders": {"confg": {"retention.ms": "1000"}}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }

    #[test]
    fn test_unquoted_numbers_keep_their_form() {
        let topics = parse(
            Path::new("t.yml"),
            "topics:\n  orders:\n    config:\n      min.cleanable.dirty.ratio: 1.0\n      max.compaction.lag.ms: 18446744073709551615\n      cleanup.ratio: 0.25\n",
        )
        .unwrap();
        let config = &topics["orders"].config;
        assert_eq!(config["min.cleanable.dirty.ratio"], "1.0");
        assert_eq!(config["max.compaction.lag.ms"], "18446744073709551615");
        assert_eq!(config["cleanup.ratio"], "0.25");

        let topics = parse(
            Path::new("t.json"),
            r#"{"topics": {"orders": {"config": {"segment.bytes": 9223372036854775808, "ratio": "0.50"}}}}"#,
        )
        .unwrap();
        assert_eq!(topics["orders"].config["segment.bytes"], "9223372036854775808");
        assert_eq!(topics["orders"].config["ratio"], "0.50");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse(Path::new("topics.ini"), "").unwrap_err();
        assert!(matches!(err, DefinitionError::UnsupportedFormat { .. }));
        assert_eq!(err.path(), Path::new("topics.ini"));
    }

    #[tokio::test]
    async fn test_later_file_wins() {
        let dir = TempDir::new().unwrap();
        let first = write(
            &dir,
            "a.yml",
            "topics:\n  orders:\n    partitions: 3\n    config:\n      retention.ms: 1000\n  events: {}\n",
        );
        let second = write(&dir, "b.yml", "topics:\n  orders:\n    partitions: 6\n");

        let loaded = load(&[first, second], false).await;
        assert!(loaded.errors.is_empty());
        assert_eq!(loaded.topics.len(), 2);
        // Whole definition replaced, config included
        assert_eq!(loaded.topics["orders"].partitions, 6);
        assert!(loaded.topics["orders"].config.is_empty());
    }

    #[tokio::test]
    async fn test_bad_files_are_reported_and_skipped() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.yml", "topics:\n  orders:\n    replication: 3\n");
        let broken = write(&dir, "broken.yml", "topics: [unterminated\n");
        let missing = dir.path().join("missing.yml");

        let loaded = load(&[good, PathBuf::new(), broken.clone(), missing.clone()], true).await;

        assert_eq!(loaded.topics.len(), 1);
        assert_eq!(loaded.topics["orders"].replication, 1);
        assert_eq!(loaded.errors.len(), 2);
        let mut failed: Vec<_> = loaded.errors.iter().map(|e| e.path().to_path_buf()).collect();
        failed.sort();
        let mut expected = vec![broken, missing];
        expected.sort();
        assert_eq!(failed, expected);
    }
}
