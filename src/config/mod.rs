//! Configuration management for storyground
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::LlmConfig;
use crate::ontology::DEFAULT_CONCEPT_LIMIT;
use crate::relations::{CONCEPTNET_ENDPOINT, DEFAULT_CONCURRENCY, DEFAULT_RELATION_LIMIT};
use crate::report::ReportFormat;
use crate::validation::ValidationConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concept extraction
    pub extraction: ExtractionConfig,

    /// Relationship lookups
    pub relations: RelationsConfig,

    /// Generator and token budgets
    pub llm: LlmConfig,

    /// Answer validation thresholds
    pub validation: ValidationConfig,

    /// Session and cache storage
    pub storage: StorageConfig,

    /// Story analysis options
    pub analysis: AnalysisConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Concept extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum concepts kept per story
    pub concept_limit: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            concept_limit: DEFAULT_CONCEPT_LIMIT,
        }
    }
}

/// Relationship lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationsConfig {
    /// ConceptNet endpoint
    pub endpoint: String,

    /// Edges requested per concept
    pub limit: usize,

    /// In-flight lookups during analysis
    pub concurrency: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Persistent lookup cache
    pub cache_path: PathBuf,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            endpoint: CONCEPTNET_ENDPOINT.to_string(),
            limit: DEFAULT_RELATION_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: 4,
            cache_path: PathBuf::from("data/conceptnet_cache.json"),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
    Redis,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Session and answer cache storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// JSON file used by the file backend
    pub path: PathBuf,

    /// Redis connection URL
    pub redis_url: String,

    /// Key prefix for the Redis backend
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data/stories.json"),
            redis_url: String::from("redis://127.0.0.1:6379"),
            key_prefix: String::from("storyground"),
        }
    }
}

/// Story analysis options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Run the physics check on every analysed story
    pub physics_check: bool,

    /// Markup for summaries and answers
    pub report_format: ReportFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            physics_check: true,
            report_format: ReportFormat::Markdown,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let extraction = ExtractionConfig {
            concept_limit: env_parse("STORYGROUND_CONCEPT_LIMIT")
                .unwrap_or(defaults.extraction.concept_limit),
        };

        let relations = RelationsConfig {
            endpoint: std::env::var("STORYGROUND_CONCEPTNET_URL")
                .unwrap_or(defaults.relations.endpoint),
            limit: env_parse("STORYGROUND_RELATION_LIMIT").unwrap_or(defaults.relations.limit),
            concurrency: env_parse("STORYGROUND_FETCH_CONCURRENCY")
                .unwrap_or(defaults.relations.concurrency),
            timeout_secs: env_parse("STORYGROUND_FETCH_TIMEOUT")
                .unwrap_or(defaults.relations.timeout_secs),
            cache_path: std::env::var("STORYGROUND_RELATION_CACHE")
                .map(PathBuf::from)
                .unwrap_or(defaults.relations.cache_path),
        };

        let backend = match std::env::var("STORYGROUND_STORAGE") {
            Ok(value) => value
                .parse::<StorageBackend>()
                .map_err(anyhow::Error::msg)
                .context("Invalid STORYGROUND_STORAGE")?,
            Err(_) => defaults.storage.backend,
        };

        let storage = StorageConfig {
            backend,
            path: std::env::var("STORYGROUND_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.path),
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.storage.redis_url),
            key_prefix: std::env::var("STORYGROUND_KEY_PREFIX")
                .unwrap_or(defaults.storage.key_prefix),
        };

        let analysis = AnalysisConfig {
            physics_check: env_parse("STORYGROUND_PHYSICS_CHECK")
                .unwrap_or(defaults.analysis.physics_check),
            report_format: env_parse("STORYGROUND_REPORT_FORMAT")
                .unwrap_or(defaults.analysis.report_format),
        };

        let logging = LoggingConfig {
            level: std::env::var("STORYGROUND_LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: std::env::var("STORYGROUND_LOG_FORMAT").unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            extraction,
            relations,
            llm: LlmConfig::from_env(),
            validation: defaults.validation,
            storage,
            analysis,
            logging,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.extraction.concept_limit == 0 {
            anyhow::bail!("concept_limit must be greater than 0");
        }

        if self.relations.concurrency == 0 {
            anyhow::bail!("relations.concurrency must be greater than 0");
        }

        let ratio = self.validation.max_foreign_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            anyhow::bail!("validation.max_foreign_ratio must be in (0, 1], got {ratio}");
        }

        let temperature = self.llm.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            anyhow::bail!("llm.temperature must be in [0, 2], got {temperature}");
        }

        Ok(())
    }

    /// Relationship lookup timeout as Duration
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.relations.timeout_secs)
    }
}
