//! Popularity enrichment from an external knowledge base
//!
//! Two steps: one ranking query returns the top entities that carry a
//! genealogy id, then their article links are looked up in batches through
//! the same resumable pipeline the crawl uses. The link cache is the
//! enrichment snapshot.

mod links;
mod merge;
mod wikidata;

pub use links::LinkHarvest;
pub use merge::{merge_rankings, MergeReport};
pub use wikidata::WikidataClient;

use crate::config::EnrichmentConfig;
use crate::crawler::{FetchGate, Pipeline, Shutdown};
use crate::state::NodeId;
use crate::storage::SnapshotStore;
use crate::HarvestError;
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Entity id to article URL; `None` when the entity has no article
pub type LinkCache = BTreeMap<u64, Option<String>>;

/// One popular entity and the genealogy record it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntity {
    /// Numeric part of the entity identifier (`Q6722` -> 6722)
    pub wiki_id: u64,
    /// Genealogy id of the matching record
    pub id: NodeId,
    /// Number of sitelinks
    pub score: u64,
    pub wiki_link: Option<String>,
}

/// A finished enrichment: ranked entities with links, and the link cache
/// they were resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub ranked: Vec<RankedEntity>,
    pub links: LinkCache,
}

/// Produces entities ordered by popularity, most popular first
#[async_trait]
pub trait RankingSource: Send + Sync {
    async fn fetch_top_ranked(&self, limit: u32) -> Result<Vec<RankedEntity>, HarvestError>;
}

/// Looks up article links for one batch of entity ids
///
/// Every id in `batch` is present in the returned map.
#[async_trait]
pub trait LinkResolver: Send + Sync + 'static {
    async fn resolve_links(&self, batch: Vec<u64>) -> Result<LinkCache, HarvestError>;
}

/// Ranks the most popular entities and attaches their article links
///
/// The ranking query runs first and is not snapshotted. Link lookups resume
/// from `snapshot` and write it back on failure. The returned cache lets the
/// caller persist a finished lookup when a later step fails.
pub async fn rank_entities<Q, R, S>(
    ranking: &Q,
    resolver: Arc<R>,
    config: &EnrichmentConfig,
    snapshot: S,
    shutdown: Shutdown,
    progress: ProgressBar,
) -> Result<Enrichment, HarvestError>
where
    Q: RankingSource + ?Sized,
    R: LinkResolver,
    S: SnapshotStore<LinkCache>,
{
    let ranked = ranking.fetch_top_ranked(config.top_ranked).await?;

    let harvest = LinkHarvest::new(
        resolver,
        ranked.iter().map(|entity| entity.wiki_id),
        config.batch_size as usize,
    );
    let gate = FetchGate::new(config.max_concurrent_requests as usize);
    let links = Pipeline::new(harvest, snapshot, gate, shutdown)
        .with_progress(progress)
        .run()
        .await?;

    Ok(Enrichment {
        ranked: attach_links(ranked, &links),
        links,
    })
}

fn attach_links(ranked: Vec<RankedEntity>, links: &LinkCache) -> Vec<RankedEntity> {
    ranked
        .into_iter()
        .map(|entity| RankedEntity {
            wiki_link: links.get(&entity.wiki_id).cloned().flatten(),
            ..entity
        })
        .collect()
}
