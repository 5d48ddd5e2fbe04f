//! Crawler module for record fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and record page parsing
//! - The fetch gate bounding concurrent requests
//! - Discovery of new ids from fetched records
//! - The resumable pipeline that drives a crawl to completion

mod crawl;
mod discovery;
mod fetcher;
mod gate;
mod parser;
mod pipeline;
pub mod shutdown;
mod source;

pub use crawl::CrawlHarvest;
pub use discovery::{resolve_and_fan_out, MAX_NODE_ID};
pub use fetcher::{build_http_client, fetch_json, fetch_text};
pub use gate::{FetchGate, GatePermit};
pub use parser::{collapse_whitespace, parse_person};
pub use pipeline::{Harvest, Pipeline, Progress};
pub use shutdown::Shutdown;
pub use source::{HttpPersonSource, PersonSource};

use crate::state::Registry;
use crate::storage::SnapshotStore;
use crate::HarvestError;
use indicatif::ProgressBar;
use std::sync::Arc;

/// Runs a complete crawl and returns the fully resolved registry
///
/// Resumes from `snapshot` if it holds a previous partial registry. On
/// failure the partial registry is written back to `snapshot`.
///
/// # Example
///
/// ```no_run
/// use genealogy_harvest::config::Config;
/// use genealogy_harvest::crawler::{build_http_client, crawl, FetchGate, HttpPersonSource, Shutdown};
/// use genealogy_harvest::storage::JsonSnapshot;
/// use indicatif::ProgressBar;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let client = build_http_client(&config.user_agent, Duration::from_secs(30))?;
/// let source = Arc::new(HttpPersonSource::new(client, &config.crawler));
/// let registry = crawl(
///     source,
///     JsonSnapshot::new("/tmp/genealogy_backup"),
///     FetchGate::new(10),
///     Shutdown::never(),
///     ProgressBar::hidden(),
/// )
/// .await?;
/// println!("{} records", registry.present_count());
/// # Ok(())
/// # }
/// ```
pub async fn crawl<P, S>(
    source: Arc<P>,
    snapshot: S,
    gate: FetchGate,
    shutdown: Shutdown,
    progress: ProgressBar,
) -> Result<Registry, HarvestError>
where
    P: PersonSource,
    S: SnapshotStore<Registry>,
{
    Pipeline::new(CrawlHarvest::new(source), snapshot, gate, shutdown)
        .with_progress(progress)
        .run()
        .await
}
