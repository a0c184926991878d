//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// ScoreStack console API - check attributes and templates
///
/// Serves the attribute and template endpoints used by the ScoreStack
/// admin console, backed by Elasticsearch.
///
/// Examples:
///   scorestack-console --es-url https://localhost:9200 --es-username elastic
///   scorestack-console --config ./scorestack.toml --bind 0.0.0.0:5601
///   scorestack-console --seed ./fixtures/seed.json
///   scorestack-console --init-config
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to listen on
    ///
    /// Default: from config or 127.0.0.1:5601.
    #[arg(short, long, value_name = "ADDR", env = "SCORESTACK_BIND")]
    pub bind: Option<String>,

    /// Elasticsearch URL
    #[arg(long, value_name = "URL", env = "SCORESTACK_ES_URL")]
    pub es_url: Option<String>,

    /// Elasticsearch username for basic auth
    #[arg(long, value_name = "USER", env = "SCORESTACK_ES_USERNAME")]
    pub es_username: Option<String>,

    /// Elasticsearch password for basic auth
    #[arg(long, value_name = "PASS", env = "SCORESTACK_ES_PASSWORD", hide_env_values = true)]
    pub es_password: Option<String>,

    /// Skip TLS certificate verification for Elasticsearch
    #[arg(long)]
    pub insecure: bool,

    /// Request timeout in seconds for Elasticsearch calls
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Serve from an in-memory store seeded with this JSON file
    ///
    /// The file maps index names to documents:
    /// { "checks": { "check1": { "name": "Check One" } } }
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .scorestack.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .scorestack.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.es_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Elasticsearch URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref seed) = self.seed {
            if !seed.is_file() {
                return Err(format!("Seed file does not exist: {}", seed.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("bind", &self.bind)
            .field("es_url", &self.es_url)
            .field("es_username", &self.es_username)
            .field("es_password", &self.es_password.as_ref().map(|_| "***"))
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .field("seed", &self.seed)
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("init_config", &self.init_config)
            .finish()
    }
}
