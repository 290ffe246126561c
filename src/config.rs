//! Configuration types for tick-relay

use crate::model::StreamId;
use serde::Deserialize;
use std::fmt;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub sink: SinkConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Source stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Redis endpoint the trade stream lives on
    pub endpoint: String,
    /// Stream key to read from
    #[serde(default = "default_stream")]
    pub stream: String,
    /// Where to start consuming
    #[serde(default)]
    pub start: StartPosition,
    /// Maximum records pulled in one read
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

/// Destination store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Redis endpoint hosting the time-series store
    pub endpoint: String,
    /// Series key prefix (`<prefix>:<symbol>:<metric>`)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Set key holding every symbol seen
    #[serde(default = "default_registry_key")]
    pub registry_key: String,
    /// Number of writer workers
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Transfer channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Batches the hand-off channel can hold before the reader blocks
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Starting cursor for the stream reader
///
/// Serialized as `"earliest"`, `"latest"`, or an explicit stream entry ID.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum StartPosition {
    /// Read the stream from its beginning
    Earliest,
    /// Only read entries appended after startup
    Latest,
    /// Resume after an explicit stream entry ID
    Explicit(String),
}

impl From<String> for StartPosition {
    fn from(value: String) -> Self {
        match value.as_str() {
            "earliest" => StartPosition::Earliest,
            "latest" => StartPosition::Latest,
            _ => StartPosition::Explicit(value),
        }
    }
}

impl Default for StartPosition {
    fn default() -> Self {
        StartPosition::Latest
    }
}

impl StartPosition {
    /// The cursor value this position resolves to
    pub fn as_cursor(&self) -> StreamId {
        match self {
            StartPosition::Earliest => StreamId::earliest(),
            StartPosition::Latest => StreamId::latest(),
            StartPosition::Explicit(id) => StreamId::new(id.clone()),
        }
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPosition::Earliest => f.write_str("earliest"),
            StartPosition::Latest => f.write_str("latest"),
            StartPosition::Explicit(id) => f.write_str(id),
        }
    }
}

fn default_stream() -> String {
    "trades".to_string()
}
fn default_max_batch_size() -> usize {
    1000
}
fn default_key_prefix() -> String {
    "trades".to_string()
}
fn default_registry_key() -> String {
    "symbols".to_string()
}
fn default_workers() -> usize {
    4
}
fn default_channel_capacity() -> usize {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
