//! Job orchestration: full harvest and single-id lookups
//!
//! A full harvest runs the crawl and the enrichment side by side. Each owns
//! its snapshot, and both are allowed to finish (or fail) before the job
//! looks at either result, so a failure in one never costs the other its
//! progress. Whichever phase completed while the other failed is written to
//! its own snapshot, so the rerun only repeats the phase that failed.
//! Snapshots are removed only after the merge succeeds.

use crate::config::Config;
use crate::crawler::{build_http_client, crawl, FetchGate, HttpPersonSource, PersonSource, Shutdown};
use crate::enrich::{merge_rankings, rank_entities, LinkResolver, RankingSource, WikidataClient};
use crate::output::{compute_statistics, log_statistics, write_slot};
use crate::state::{NodeId, Registry, Slot};
use crate::storage::{open_snapshots, SnapshotStore};
use crate::HarvestError;
use futures::stream::{FuturesOrdered, StreamExt};
use indicatif::ProgressBar;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Progress bars for the two concurrent phases
#[derive(Debug, Clone)]
pub struct PhaseProgress {
    pub crawl: ProgressBar,
    pub enrichment: ProgressBar,
}

impl PhaseProgress {
    pub fn hidden() -> Self {
        Self {
            crawl: ProgressBar::hidden(),
            enrichment: ProgressBar::hidden(),
        }
    }
}

/// Runs a full harvest against the configured HTTP endpoints
///
/// Returns the merged registry. Both snapshot files are deleted on success
/// and left in place on failure.
pub async fn harvest_all(
    config: &Config,
    shutdown: Shutdown,
    progress: PhaseProgress,
) -> Result<Registry, HarvestError> {
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )
    .map_err(|source| HarvestError::Http {
        url: config.crawler.base_url.clone(),
        source,
    })?;

    let source = Arc::new(HttpPersonSource::new(client.clone(), &config.crawler));
    let wikidata = Arc::new(WikidataClient::new(client, &config.enrichment));

    run_full(source, wikidata.as_ref(), Arc::clone(&wikidata), config, shutdown, progress).await
}

/// Full harvest over arbitrary sources
pub async fn run_full<P, Q, R>(
    source: Arc<P>,
    ranking: &Q,
    resolver: Arc<R>,
    config: &Config,
    shutdown: Shutdown,
    progress: PhaseProgress,
) -> Result<Registry, HarvestError>
where
    P: PersonSource,
    Q: RankingSource + ?Sized,
    R: LinkResolver,
{
    let (crawl_snapshot, link_snapshot) = open_snapshots(&config.snapshot);
    tracing::info!(
        "snapshots: crawl {}, enrichment {}",
        crawl_snapshot.location(),
        link_snapshot.location()
    );

    let crawl_gate = FetchGate::new(config.crawler.max_concurrent_requests as usize);
    let (crawled, ranked) = tokio::join!(
        crawl(
            source,
            crawl_snapshot.clone(),
            crawl_gate,
            shutdown.clone(),
            progress.crawl
        ),
        rank_entities(
            ranking,
            resolver,
            &config.enrichment,
            link_snapshot.clone(),
            shutdown,
            progress.enrichment
        ),
    );

    let mut registry = match crawled {
        Ok(registry) => registry,
        Err(e) => {
            match &ranked {
                Ok(enrichment) => {
                    tracing::warn!("writing completed link lookup to {}", link_snapshot.location());
                    if let Err(save) = link_snapshot.save(&enrichment.links) {
                        tracing::error!("failed to write snapshot: {}", save);
                    }
                }
                Err(enrichment) => tracing::error!("enrichment failed: {}", enrichment),
            }
            return Err(e);
        }
    };
    let enrichment = match ranked {
        Ok(enrichment) => enrichment,
        Err(e) => {
            // The crawl finished but the job did not; keep its result for the rerun.
            tracing::warn!("writing completed crawl to {}", crawl_snapshot.location());
            if let Err(save) = crawl_snapshot.save(&registry) {
                tracing::error!("failed to write snapshot: {}", save);
            }
            return Err(e);
        }
    };

    merge_rankings(&mut registry, enrichment.ranked);
    log_statistics(&compute_statistics(&registry));

    crawl_snapshot.remove()?;
    link_snapshot.remove()?;
    Ok(registry)
}

/// Fetches each id and writes one JSON line per id, in request order
///
/// Absent ids are written as `{}`. Nothing is snapshotted.
pub async fn harvest_ids<P, W>(
    source: Arc<P>,
    ids: &[NodeId],
    gate: FetchGate,
    mut shutdown: Shutdown,
    mut writer: W,
) -> Result<(), HarvestError>
where
    P: PersonSource,
    W: Write,
{
    let mut lookups: FuturesOrdered<_> = ids
        .iter()
        .map(|&id| {
            let source = Arc::clone(&source);
            let gate = gate.clone();
            async move {
                let _permit = gate.acquire().await?;
                source.fetch_person(id).await
            }
        })
        .collect();

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.recv() => return Err(HarvestError::Interrupted),
            next = lookups.next() => next,
        };
        let Some(outcome) = next else { break };
        write_slot(&mut writer, &Slot::from(outcome?))?;
    }

    writer.flush()?;
    Ok(())
}

/// Single-id mode against the configured directory
pub async fn lookup_ids<W: Write>(
    config: &Config,
    ids: &[NodeId],
    shutdown: Shutdown,
    writer: W,
) -> Result<(), HarvestError> {
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )
    .map_err(|source| HarvestError::Http {
        url: config.crawler.base_url.clone(),
        source,
    })?;
    let source = Arc::new(HttpPersonSource::new(client, &config.crawler));
    let gate = FetchGate::new(config.crawler.max_concurrent_requests as usize);

    harvest_ids(source, ids, gate, shutdown, writer).await
}
