//! CampusLens - Student Performance Analytics Dashboard
//!
//! Fetches academic, placement, and faculty evaluation datasets from
//! S3-compatible object storage, aggregates them into dashboard metrics,
//! and answers free-text questions about the results.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, invalid arguments, etc.)

mod analytics;
mod canonical;
mod cli;
mod config;
mod dashboard;
mod models;
mod report;
mod resolver;
mod store;
mod summarizer;
mod web;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::time::Duration;
use store::DatasetStore;
use summarizer::Summarizer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("CampusLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .campuslens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".campuslens.toml");

    if path.exists() {
        eprintln!("⚠️  .campuslens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .campuslens.toml")?;

    println!("✅ Created .campuslens.toml with default settings.");
    println!("   Edit it to customize storage, summarizer, and server settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .campuslens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Dispatch to the selected mode: serve, ask, or snapshot.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let store = DatasetStore::new(&config.storage);
    let summarizer = Summarizer::new(config.summarizer.clone());

    if args.serve {
        let addr: SocketAddr = config
            .server
            .address
            .parse()
            .with_context(|| format!("Invalid listen address: {}", config.server.address))?;

        println!("🌐 Serving dashboard at http://{addr}");
        let state = web::AppState {
            store,
            summarizer,
            top_n: Some(config.general.top_n),
        };
        web::serve(state, addr).await;
        return Ok(());
    }

    if let Some(question) = &args.ask {
        return run_ask(question, &store).await;
    }

    run_snapshot(&args, &config, &store, &summarizer).await
}

/// Answer one question from freshly built bundles and print it.
async fn run_ask(question: &str, store: &DatasetStore) -> Result<()> {
    // Rankings stay uncapped; the resolver applies the question's top-N.
    let bundles = dashboard::build_bundles(store, None).await;
    let answer = resolver::answer(question, &bundles);

    if answer.matched {
        println!("{}", answer.summary);
    } else {
        println!("🤔 {}", answer.summary);
    }
    Ok(())
}

/// Build the dashboard payload and write it to the output file.
async fn run_snapshot(
    args: &Args,
    config: &Config,
    store: &DatasetStore,
    summarizer: &Summarizer,
) -> Result<()> {
    println!("📥 Fetching datasets from {}", describe_source(config));

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message("Aggregating metrics...");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let payload =
        dashboard::build_payload(store, summarizer, Some(config.general.top_n)).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&payload)?,
        OutputFormat::Markdown => report::generate_markdown_report(&payload),
    };

    std::fs::write(&args.output, &output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    // Print summary
    println!("\n📊 Dashboard Summary:");
    for bundle in [
        &payload.bundles.academic,
        &payload.bundles.placement,
        &payload.bundles.evaluation,
    ] {
        let status = if bundle.is_dataset_error() {
            "unavailable".to_string()
        } else {
            format!("{} metrics", bundle.metrics.len())
        };
        println!("   {}: {}", bundle.domain, status);
    }
    println!(
        "\n✅ Snapshot complete! Report saved to: {}",
        args.output.display()
    );

    Ok(())
}

fn describe_source(config: &Config) -> String {
    match &config.storage.local_dir {
        Some(dir) => format!("local directory {}", dir.display()),
        None => format!(
            "{}/{}",
            config.storage.endpoint.trim_end_matches('/'),
            config.storage.bucket
        ),
    }
}
