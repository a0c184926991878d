//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.scorestack.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::store::ElasticsearchConfig;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".scorestack.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Elasticsearch connection settings.
    #[serde(default)]
    pub elasticsearch: EsConfig,

    /// Index naming settings.
    #[serde(default)]
    pub indices: IndexConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5601".to_string()
}

/// Elasticsearch connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsConfig {
    /// Cluster URL.
    #[serde(default = "default_es_url")]
    pub url: String,

    /// Basic auth username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Validate the cluster's TLS certificate.
    #[serde(default = "default_true")]
    pub verify_certs: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            username: None,
            password: None,
            verify_certs: true,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_es_url() -> String {
    "https://localhost:9200".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

/// Index names and the check id naming convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Prefix shared by all attribute indices (`attrib_<scope>_<group>`).
    #[serde(default = "default_attribute_prefix")]
    pub attribute_prefix: String,

    /// Index holding check descriptors.
    #[serde(default = "default_checks")]
    pub checks: String,

    /// Index holding check templates.
    #[serde(default = "default_templates")]
    pub templates: String,

    /// Separator between group and check in a check id.
    #[serde(default = "default_group_delimiter")]
    pub group_delimiter: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            attribute_prefix: default_attribute_prefix(),
            checks: default_checks(),
            templates: default_templates(),
            group_delimiter: default_group_delimiter(),
        }
    }
}

fn default_attribute_prefix() -> String {
    "attrib_".to_string()
}

fn default_checks() -> String {
    "checks".to_string()
}

fn default_templates() -> String {
    "templates".to_string()
}

fn default_group_delimiter() -> String {
    "-".to_string()
}

impl IndexConfig {
    /// Pattern matching every attribute index.
    pub fn attribute_pattern(&self) -> String {
        format!("{}*", self.attribute_prefix)
    }

    /// Pattern matching the attribute indices of one group.
    pub fn group_attribute_pattern(&self, group: &str) -> String {
        format!("{}*_{}", self.attribute_prefix, group)
    }
}

impl From<&EsConfig> for ElasticsearchConfig {
    fn from(config: &EsConfig) -> Self {
        Self {
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            verify_certs: config.verify_certs,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(ref url) = args.es_url {
            self.elasticsearch.url = url.clone();
        }
        if let Some(ref username) = args.es_username {
            self.elasticsearch.username = Some(username.clone());
        }
        if let Some(ref password) = args.es_password {
            self.elasticsearch.password = Some(password.clone());
        }
        if let Some(timeout) = args.timeout {
            self.elasticsearch.timeout_seconds = timeout;
        }

        // Flags always override
        if args.insecure {
            self.elasticsearch.verify_certs = false;
        }
    }

    /// Check values that would only fail later at runtime.
    pub fn validate(&self) -> Result<(), String> {
        let url = &self.elasticsearch.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("Elasticsearch URL must start with 'http://' or 'https://'".to_string());
        }

        if self.elasticsearch.timeout_seconds == 0 {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.indices.group_delimiter.is_empty() {
            return Err("Group delimiter must not be empty".to_string());
        }

        if self.indices.attribute_prefix.is_empty() {
            return Err("Attribute index prefix must not be empty".to_string());
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
