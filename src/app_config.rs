/*!
 * Application configuration.
 *
 * Loading, validating and saving the JSON settings file, with serde defaults
 * for every field left out.
 */

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Upper bound for `models.retry_count`
pub const MAX_RETRY_COUNT: u32 = 10;

/// Upper bound for `models.retry_backoff_ms`
pub const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

/// Application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Alignment settings
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Embedding and entity model settings
    #[serde(default)]
    pub models: ModelConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How accepted matches are assigned
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Independent best match per source caption; targets may repeat
    #[default]
    Greedy,
    /// Each source and each target caption is used at most once
    Exclusive,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Which entity recognizer backs the entity bonus
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityRecognizerKind {
    // @recognizer: Regex rules, offline
    #[default]
    Heuristic,
    // @recognizer: LLM served by Ollama
    Ollama,
    // @recognizer: Disabled, no bonus ever applies
    None,
}

impl std::fmt::Display for EntityRecognizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Heuristic => write!(f, "heuristic"),
            Self::Ollama => write!(f, "ollama"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Alignment algorithm settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlignmentConfig {
    /// Maximum start-time distance between candidate captions, in milliseconds
    #[serde(default = "default_time_tolerance_ms")]
    pub time_tolerance_ms: u64,

    /// A match must score strictly above this to be accepted (0.0 to 1.0)
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    /// Added to the semantic score when entity sets overlap
    #[serde(default = "default_entity_bonus")]
    pub entity_bonus: f64,

    /// Assignment strategy
    #[serde(default)]
    pub strategy: MatchStrategy,

    /// Maximum number of concurrent model requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Number of texts sent per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            time_tolerance_ms: default_time_tolerance_ms(),
            acceptance_threshold: default_acceptance_threshold(),
            entity_bonus: default_entity_bonus(),
            strategy: MatchStrategy::default(),
            concurrent_requests: default_concurrent_requests(),
            embedding_batch_size: default_embedding_batch_size(),
        }
    }
}

/// Model back-end settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    /// Ollama service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Multilingual sentence-embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Entity recognizer back-end
    #[serde(default)]
    pub entity_recognizer: EntityRecognizerKind,

    /// LLM used when `entity_recognizer` is `ollama`
    #[serde(default = "default_entity_model")]
    pub entity_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            embedding_model: default_embedding_model(),
            entity_recognizer: EntityRecognizerKind::default(),
            entity_model: default_entity_model(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Output file format
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full report with statistics
    #[default]
    Json,
    /// Bilingual SRT, source line above target line
    Srt,
    /// Tab-separated rows
    Tsv,
}

impl OutputFormat {
    // @returns: File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Srt => "srt",
            Self::Tsv => "tsv",
        }
    }
}

/// Output settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Format of the written alignment
    #[serde(default)]
    pub format: OutputFormat,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_time_tolerance_ms() -> u64 {
    2000
}

fn default_acceptance_threshold() -> f64 {
    0.65
}

fn default_entity_bonus() -> f64 {
    0.2
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_embedding_batch_size() -> usize {
    32
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "paraphrase-multilingual".to_string()
}

fn default_entity_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        let alignment = &self.alignment;
        if !(0.0..1.0).contains(&alignment.acceptance_threshold) {
            return Err(anyhow!(
                "Acceptance threshold must be in [0, 1), got {}",
                alignment.acceptance_threshold
            ));
        }
        if alignment.entity_bonus.is_nan() || alignment.entity_bonus < 0.0 {
            return Err(anyhow!("Entity bonus must not be negative, got {}", alignment.entity_bonus));
        }
        if alignment.time_tolerance_ms == 0 {
            return Err(anyhow!("Time tolerance must be greater than zero"));
        }
        if alignment.concurrent_requests == 0 {
            return Err(anyhow!("Concurrent requests must be at least 1"));
        }
        if alignment.embedding_batch_size == 0 {
            return Err(anyhow!("Embedding batch size must be at least 1"));
        }

        let models = &self.models;
        url::Url::parse(&models.endpoint)
            .with_context(|| format!("Invalid model endpoint: {}", models.endpoint))?;
        if models.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!("Retry count must be at most {}, got {}", MAX_RETRY_COUNT, models.retry_count));
        }
        if models.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(anyhow!(
                "Retry backoff must be at most {} ms, got {}",
                MAX_RETRY_BACKOFF_MS,
                models.retry_backoff_ms
            ));
        }
        if models.embedding_model.trim().is_empty() {
            return Err(anyhow!("An embedding model is required"));
        }
        if models.entity_recognizer == EntityRecognizerKind::Ollama && models.entity_model.trim().is_empty() {
            return Err(anyhow!("An entity model is required for the ollama entity recognizer"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "zh".to_string(),
            alignment: AlignmentConfig::default(),
            models: ModelConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
