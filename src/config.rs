//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.campuslens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Object storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Narrative summarizer settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Dashboard server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default snapshot output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Cap for ranking metrics on the dashboard payload.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            top_n: default_top_n(),
        }
    }
}

fn default_output() -> String {
    "campuslens_report.md".to_string()
}

fn default_top_n() -> usize {
    5
}

/// Object storage settings for the raw dataset provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3-compatible endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bucket holding the dataset objects.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Object key of the academic exam dataset.
    #[serde(default = "default_academic_key")]
    pub academic_key: String,

    /// Object key of the placement outcomes dataset.
    #[serde(default = "default_placement_key")]
    pub placement_key: String,

    /// Object key of the faculty evaluation dataset.
    #[serde(default = "default_evaluation_key")]
    pub evaluation_key: String,

    /// Local directory overriding the remote store (development).
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_storage_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            bucket: default_bucket(),
            academic_key: default_academic_key(),
            placement_key: default_placement_key(),
            evaluation_key: default_evaluation_key(),
            local_dir: None,
            timeout_seconds: default_storage_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://s3.us-east-1.amazonaws.com".to_string()
}

fn default_bucket() -> String {
    "student-performance-dashboard".to_string()
}

fn default_academic_key() -> String {
    "data/exam_data.csv".to_string()
}

fn default_placement_key() -> String {
    "data/placement_data.csv".to_string()
}

fn default_evaluation_key() -> String {
    "data/faculty_evaluation.csv".to_string()
}

fn default_storage_timeout() -> u64 {
    30
}

/// Settings for the optional LLM narrative summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Append a narrative to the dashboard payload.
    #[serde(default)]
    pub enabled: bool,

    /// Ollama model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds. The narrative is optional, so this
    /// also bounds how long a dashboard request waits for it.
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_summarizer_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_summarizer_timeout() -> u64 {
    60
}

/// Dashboard HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8000".to_string()
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
        let default_path = Path::new(".campuslens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Summarizer settings - model and URL have CLI defaults, always override
        self.summarizer.model = args.model.clone();
        self.summarizer.ollama_url = args.ollama_url.clone();

        // Narrative toggle - only override if explicitly provided via CLI flags
        if args.narrative {
            self.summarizer.enabled = true;
        } else if args.no_narrative {
            self.summarizer.enabled = false;
        }

        // Storage settings - only override if provided
        if let Some(ref endpoint) = args.endpoint {
            self.storage.endpoint = endpoint.clone();
        }
        if let Some(ref bucket) = args.bucket {
            self.storage.bucket = bucket.clone();
        }
        if let Some(ref local) = args.local {
            self.storage.local_dir = Some(local.clone());
        }

        // Server settings
        if let Some(ref address) = args.address {
            self.server.address = address.clone();
        }

        // General settings
        if let Some(top_n) = args.top_n {
            self.general.top_n = top_n;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
