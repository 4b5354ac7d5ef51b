//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// CampusLens - student performance analytics dashboard
///
/// Fetches academic, placement, and faculty evaluation datasets from
/// S3-compatible object storage, aggregates them into dashboard metrics,
/// and answers free-text questions about the results.
///
/// Examples:
///   campuslens --serve
///   campuslens --ask "average package for CSE"
///   campuslens --format json --output dashboard.json
///   campuslens --local ./sample-data --ask "top 5 companies"
///   campuslens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Run the dashboard HTTP server instead of writing a snapshot
    #[arg(long, conflicts_with = "ask")]
    pub serve: bool,

    /// Answer one free-text question and exit
    ///
    /// The question is matched against precomputed metrics; the answer
    /// is printed to stdout.
    #[arg(short, long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Listen address for --serve
    #[arg(long, value_name = "ADDR", env = "CAMPUSLENS_ADDR")]
    pub address: Option<String>,

    /// Output file path for the snapshot report
    #[arg(
        short,
        long,
        default_value = "campuslens_report.md",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// Output format for the snapshot (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Cap for ranking metrics on the dashboard (top subjects, companies, ...)
    ///
    /// If not specified, uses the config value (default 5).
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Local directory holding the dataset CSV files
    ///
    /// Overrides the remote object store; object keys are resolved as
    /// paths under this directory.
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Object storage endpoint URL
    #[arg(long, value_name = "URL", env = "CAMPUSLENS_S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Object storage bucket name
    #[arg(long, value_name = "BUCKET", env = "CAMPUSLENS_S3_BUCKET")]
    pub bucket: Option<String>,

    /// Ollama model used for the optional narrative summary
    #[arg(long, default_value = "llama3.2:latest", env = "CAMPUSLENS_MODEL")]
    pub model: String,

    /// Ollama API endpoint URL
    #[arg(long, default_value = "http://localhost:11434", env = "OLLAMA_URL")]
    pub ollama_url: String,

    /// Append an LLM-generated narrative to the dashboard payload
    ///
    /// Overrides the config file setting.
    #[arg(long, conflicts_with = "no_narrative")]
    pub narrative: bool,

    /// Disable the LLM narrative even if enabled in the config file
    #[arg(long, conflicts_with = "narrative")]
    pub no_narrative: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .campuslens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .campuslens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the snapshot report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
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

        if let Some(question) = &self.ask {
            if question.trim().is_empty() {
                return Err("--ask requires a non-empty question".to_string());
            }
        }

        if !self.ollama_url.starts_with("http://") && !self.ollama_url.starts_with("https://") {
            return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Storage endpoint must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(address) = &self.address {
            if address.parse::<std::net::SocketAddr>().is_err() {
                return Err(format!("Invalid listen address: {address}"));
            }
        }

        if self.top_n == Some(0) {
            return Err("--top-n must be at least 1".to_string());
        }

        Ok(())
    }

    /// Logging level derived from the verbosity flags.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::WARN
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
