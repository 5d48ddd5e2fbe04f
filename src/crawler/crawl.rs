//! The person-id crawl: the registry instantiation of the pipeline

use crate::crawler::discovery::resolve_and_fan_out;
use crate::crawler::pipeline::{Harvest, Progress};
use crate::crawler::source::PersonSource;
use crate::state::{NodeId, Record, Registry};
use crate::HarvestError;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Crawls the id space starting from id 1, following every reference
pub struct CrawlHarvest<P> {
    source: Arc<P>,
}

impl<P: PersonSource> CrawlHarvest<P> {
    pub fn new(source: Arc<P>) -> Self {
        Self { source }
    }
}

impl<P: PersonSource> Harvest for CrawlHarvest<P> {
    type Key = NodeId;
    type Output = Option<Record>;
    type Store = Registry;

    fn name(&self) -> &'static str {
        "crawl"
    }

    fn initial_store(&self) -> Registry {
        Registry::new()
    }

    fn pending(&self, registry: &Registry) -> Vec<NodeId> {
        registry.pending_ids()
    }

    fn fetch(&self, id: NodeId) -> BoxFuture<'static, Result<Option<Record>, HarvestError>> {
        let source = Arc::clone(&self.source);
        Box::pin(async move { source.fetch_person(id).await })
    }

    fn resolve(
        &self,
        registry: &mut Registry,
        id: NodeId,
        outcome: Option<Record>,
    ) -> Result<Vec<NodeId>, HarvestError> {
        resolve_and_fan_out(registry, id, outcome).map(Iterator::collect)
    }

    fn progress(&self, registry: &Registry) -> Progress {
        Progress {
            done: registry.resolved_count() as u64,
            total: registry.len().saturating_sub(1) as u64,
        }
    }
}
