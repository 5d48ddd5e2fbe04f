//! Genealogy-Harvest main entry point
//!
//! This is the command-line interface for the Genealogy-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use genealogy_harvest::config::{load_config_with_hash, validate, Config};
use genealogy_harvest::crawler::shutdown::{self, spawn_ctrl_c_listener};
use genealogy_harvest::job::{harvest_all, lookup_ids, PhaseProgress};
use genealogy_harvest::output::write_registry;
use genealogy_harvest::state::NodeId;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Genealogy-Harvest: a resumable academic-genealogy crawler
///
/// Crawls every record of the genealogy directory, ranks the most popular
/// ones against an external knowledge base, and prints the merged result as
/// one JSON document. An interrupted or failed run leaves snapshot files
/// behind; running the same command again resumes from them.
#[derive(Parser, Debug)]
#[command(name = "genealogy-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable academic-genealogy crawler", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show progress bars on stderr
    #[arg(short, long)]
    progress: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fetch only these ids, printing one JSON line per id
    #[arg(value_name = "IDS")]
    ids: Vec<NodeId>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            let config = Config::default();
            validate(&config).context("default configuration is invalid")?;
            config
        }
    };

    let (trigger, shutdown) = shutdown::channel();
    let listener = spawn_ctrl_c_listener(trigger);

    let outcome = if cli.ids.is_empty() {
        let progress = phase_progress(cli.progress);
        harvest_all(&config, shutdown, progress)
            .await
            .and_then(|registry| write_registry(std::io::stdout().lock(), &registry))
            .context("harvest failed")
    } else {
        lookup_ids(&config, &cli.ids, shutdown, std::io::stdout().lock())
            .await
            .context("lookup failed")
    };

    listener.abort();
    if let Err(e) = &outcome {
        tracing::error!("{:#}", e);
    }
    outcome
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("genealogy_harvest=info,warn"),
            2 => EnvFilter::new("genealogy_harvest=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn phase_progress(enabled: bool) -> PhaseProgress {
    if !enabled {
        return PhaseProgress::hidden();
    }

    let bars = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{prefix:>6} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");

    let crawl = bars.add(ProgressBar::new(0).with_style(style.clone()).with_prefix("crawl"));
    let enrichment = bars.add(ProgressBar::new(0).with_style(style).with_prefix("links"));
    PhaseProgress { crawl, enrichment }
}
