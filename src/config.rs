//! Kafka client settings
//!
//! Settings are collected once at startup, in increasing precedence, from
//! `.properties` files, `KAFKA_CFG_*` environment variables and the
//! bootstrap address given on the command line.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Prefix of environment variables forwarded to the Kafka client
const ENV_PREFIX: &str = "KAFKA_CFG_";

/// Client property naming the brokers to bootstrap from
pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";

/// Immutable Kafka client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    properties: BTreeMap<String, String>,
}

impl ClientSettings {
    /// Build the settings from property files, the process environment and
    /// the bootstrap address
    pub fn load(bootstrap: &str, property_files: &[PathBuf]) -> Result<Self> {
        Self::from_sources(bootstrap, property_files, std::env::vars())
    }

    /// Same as [`ClientSettings::load`], with an explicit set of environment variables
    pub fn from_sources(
        bootstrap: &str,
        property_files: &[PathBuf],
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut properties = BTreeMap::new();

        for path in property_files {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            let content = fs::read_to_string(&expanded)
                .with_context(|| format!("Could not read properties file {expanded}"))?;
            let parsed = parse_properties(&content);
            log::debug!("Loaded {} client properties from {expanded}", parsed.len());
            properties.extend(parsed);
        }

        properties.extend(from_env(vars));
        properties.insert(BOOTSTRAP_SERVERS.to_string(), bootstrap.to_string());

        Ok(Self { properties })
    }

    /// Look up one property
    #[cfg_attr(not(feature = "kafka"), allow(dead_code))]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Every property, sorted by key
    #[cfg_attr(not(feature = "kafka"), allow(dead_code))]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Translate `KAFKA_CFG_*` variables into client properties
///
/// `KAFKA_CFG_SECURITY_PROTOCOL=SSL` becomes `security.protocol=SSL`.
pub fn from_env(vars: impl IntoIterator<Item = (String, String)>) -> BTreeMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix(ENV_PREFIX)?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_lowercase().replace('_', "."), value))
        })
        .collect()
}

/// Parse the contents of a Java-style `.properties` file
///
/// Supports `key=value` and `key: value` lines, `#` and `!` comments and
/// blank lines. Whitespace around keys and values is trimmed.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let split = line.find(['=', ':']);
        let (key, value) = match split {
            Some(idx) => (&line[..idx], &line[idx + 1..]),
            None => (line, ""),
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        properties.insert(key.to_string(), value.trim().to_string());
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_properties() {
        let props = parse_properties(
            "# comment\n! also a comment\n\nsecurity.protocol=SASL_SSL\nsasl.mechanism : PLAIN\nempty.value=\nurl=http://host:8080/path\n",
        );
        assert_eq!(props.get("security.protocol").map(String::as_str), Some("SASL_SSL"));
        assert_eq!(props.get("sasl.mechanism").map(String::as_str), Some("PLAIN"));
        assert_eq!(props.get("empty.value").map(String::as_str), Some(""));
        assert_eq!(
            props.get("url").map(String::as_str),
            Some("http://host:8080/path")
        );
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_from_env() {
        let vars = vec![
            ("KAFKA_CFG_SECURITY_PROTOCOL".to_string(), "SSL".to_string()),
            ("KAFKA_CFG_".to_string(), "ignored".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let props = from_env(vars);
        assert_eq!(
            props,
            BTreeMap::from([("security.protocol".to_string(), "SSL".to_string())])
        );
    }

    #[test]
    fn test_precedence() {
        let mut first = NamedTempFile::new().unwrap();
        writeln!(first, "client.id=from-first\nsecurity.protocol=PLAINTEXT\nbootstrap.servers=file:9092").unwrap();
        let mut second = NamedTempFile::new().unwrap();
        writeln!(second, "client.id=from-second").unwrap();

        let settings = ClientSettings::from_sources(
            "cli:9092",
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            vec![("KAFKA_CFG_SECURITY_PROTOCOL".to_string(), "SSL".to_string())],
        )
        .unwrap();

        assert_eq!(settings.get("client.id"), Some("from-second"));
        assert_eq!(settings.get("security.protocol"), Some("SSL"));
        assert_eq!(settings.get(BOOTSTRAP_SERVERS), Some("cli:9092"));
        assert_eq!(settings.iter().count(), 3);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = ClientSettings::from_sources(
            "localhost:9092",
            &[PathBuf::from("/definitely/not/here.properties")],
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.properties"));
    }
}
