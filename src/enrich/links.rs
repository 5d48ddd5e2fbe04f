//! Batched link lookup: the link-cache instantiation of the pipeline

use crate::crawler::{Harvest, Progress};
use crate::enrich::{LinkCache, LinkResolver};
use crate::HarvestError;
use futures::future::BoxFuture;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Resolves a fixed set of entity ids in batches
///
/// A key is one batch of ids missing from the cache. Lookups reveal nothing
/// new, so the run ends when the initial batches finish.
pub struct LinkHarvest<R> {
    resolver: Arc<R>,
    ids: BTreeSet<u64>,
    batch_size: usize,
}

impl<R: LinkResolver> LinkHarvest<R> {
    pub fn new(resolver: Arc<R>, ids: impl IntoIterator<Item = u64>, batch_size: usize) -> Self {
        Self {
            resolver,
            ids: ids.into_iter().collect(),
            batch_size: batch_size.max(1),
        }
    }
}

impl<R: LinkResolver> Harvest for LinkHarvest<R> {
    type Key = Vec<u64>;
    type Output = LinkCache;
    type Store = LinkCache;

    fn name(&self) -> &'static str {
        "links"
    }

    fn initial_store(&self) -> LinkCache {
        LinkCache::new()
    }

    fn pending(&self, cache: &LinkCache) -> Vec<Vec<u64>> {
        let missing: Vec<u64> = self
            .ids
            .iter()
            .copied()
            .filter(|id| !cache.contains_key(id))
            .collect();
        missing
            .chunks(self.batch_size)
            .map(<[u64]>::to_vec)
            .collect()
    }

    fn fetch(&self, batch: Vec<u64>) -> BoxFuture<'static, Result<LinkCache, HarvestError>> {
        let resolver = Arc::clone(&self.resolver);
        Box::pin(async move { resolver.resolve_links(batch).await })
    }

    fn resolve(
        &self,
        cache: &mut LinkCache,
        _batch: Vec<u64>,
        links: LinkCache,
    ) -> Result<Vec<Vec<u64>>, HarvestError> {
        cache.extend(links);
        Ok(Vec::new())
    }

    fn progress(&self, cache: &LinkCache) -> Progress {
        Progress {
            done: self.ids.iter().filter(|id| cache.contains_key(id)).count() as u64,
            total: self.ids.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoResolver;

    #[async_trait::async_trait]
    impl LinkResolver for NoResolver {
        async fn resolve_links(&self, batch: Vec<u64>) -> Result<LinkCache, HarvestError> {
            Ok(batch.into_iter().map(|id| (id, None)).collect())
        }
    }

    #[test]
    fn test_pending_batches_skip_cached_ids() {
        let harvest = LinkHarvest::new(Arc::new(NoResolver), [5, 1, 2, 3, 4, 5, 6], 2);
        let mut cache = LinkCache::new();
        cache.insert(3, None);

        assert_eq!(harvest.pending(&cache), vec![vec![1, 2], vec![4, 5], vec![6]]);
        assert_eq!(harvest.progress(&cache), Progress { done: 1, total: 6 });
    }

    #[test]
    fn test_resolve_extends_cache() {
        let harvest = LinkHarvest::new(Arc::new(NoResolver), [1, 2], 50);
        let mut cache = LinkCache::new();
        let links = LinkCache::from([(1, Some("https://en.example.org/One".to_string())), (2, None)]);

        let revealed = harvest.resolve(&mut cache, vec![1, 2], links).unwrap();
        assert!(revealed.is_empty());
        assert!(harvest.pending(&cache).is_empty());
    }
}
