//! Configuration system for strata.

use serde::{Deserialize, Serialize};

use crate::traits::{TripleStoreConfig, TripleStoreProvider};

/// Version log provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionLogProvider {
    #[default]
    Memory,
    Sqlite,
}

/// Version log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionLogConfig {
    /// Provider type.
    pub provider: VersionLogProvider,
    /// Database path (ignored by the memory provider).
    pub path: String,
}

impl Default for VersionLogConfig {
    fn default() -> Self {
        Self {
            provider: VersionLogProvider::Memory,
            path: ":memory:".to_string(),
        }
    }
}

/// Main versioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Graph URI used to scope snapshot capture/restore and reconstructed
    /// triples when a query does not name one.
    pub default_graph_uri: String,
    /// Upper bound on triple store query latency, in seconds.
    pub query_timeout_seconds: u64,
    /// Triple store backend configuration.
    pub triple_store: TripleStoreConfig,
    /// Version log backend configuration.
    pub version_log: VersionLogConfig,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            default_graph_uri: "urn:strata:graph:default".to_string(),
            query_timeout_seconds: 30,
            triple_store: TripleStoreConfig::default(),
            version_log: VersionLogConfig::default(),
        }
    }
}

impl VersioningConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::StrataResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| crate::error::StrataError::Configuration(e.to_string())),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| crate::error::StrataError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| crate::error::StrataError::Configuration(e.to_string())),
            _ => Err(crate::error::StrataError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(graph) = std::env::var("STRATA_DEFAULT_GRAPH_URI") {
            config.default_graph_uri = graph;
        }
        if let Ok(timeout) = std::env::var("STRATA_QUERY_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse() {
                config.query_timeout_seconds = seconds;
            }
        }
        if let Ok(provider) = std::env::var("STRATA_TRIPLE_STORE_PROVIDER") {
            config.triple_store.provider = match provider.to_lowercase().as_str() {
                "sqlite" => TripleStoreProvider::Sqlite,
                _ => TripleStoreProvider::Memory,
            };
        }
        if let Ok(url) = std::env::var("STRATA_TRIPLE_STORE_URL") {
            config.triple_store.url = url;
        }
        if let Ok(path) = std::env::var("STRATA_VERSION_LOG_PATH") {
            config.version_log.provider = VersionLogProvider::Sqlite;
            config.version_log.path = path;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = VersioningConfig::default();
        assert_eq!(config.default_graph_uri, "urn:strata:graph:default");
        assert_eq!(config.query_timeout_seconds, 30);
        assert_eq!(config.triple_store.provider, TripleStoreProvider::Memory);
        assert_eq!(config.version_log.provider, VersionLogProvider::Memory);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
default_graph_uri = "urn:test:graph"
query_timeout_seconds = 5

[triple_store]
provider = "sqlite"
url = "/tmp/triples.db"
"#
        )
        .unwrap();

        let config = VersioningConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_graph_uri, "urn:test:graph");
        assert_eq!(config.query_timeout_seconds, 5);
        assert_eq!(config.triple_store.provider, TripleStoreProvider::Sqlite);
        // Unspecified sections fall back to defaults
        assert_eq!(config.version_log.provider, VersionLogProvider::Memory);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"default_graph_uri": "urn:test:json", "query_timeout_seconds": 10}}"#
        )
        .unwrap();

        let config = VersioningConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_graph_uri, "urn:test:json");
        assert_eq!(config.query_timeout_seconds, 10);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
default_graph_uri: "urn:test:yaml"
query_timeout_seconds: 15
version_log:
  provider: sqlite
  path: /tmp/versions.db
"#
        )
        .unwrap();

        let config = VersioningConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_graph_uri, "urn:test:yaml");
        assert_eq!(config.query_timeout_seconds, 15);
        assert_eq!(config.version_log.provider, VersionLogProvider::Sqlite);
        assert_eq!(config.version_log.path, "/tmp/versions.db");
        assert_eq!(config.triple_store.provider, TripleStoreProvider::Memory);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(VersioningConfig::from_file(file.path()).is_err());
    }
}
