use crate::enrich::RankedEntity;
use crate::state::{NodeId, Rank, Registry};

/// Outcome of merging ranked entities into a registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Records that received rank attributes
    pub merged: usize,

    /// Ids at or beyond the registry's length
    pub unreachable: Vec<NodeId>,

    /// Ids inside the registry whose slot holds no record
    pub without_record: Vec<NodeId>,
}

/// Attaches each entity's rank attributes to its record
///
/// The registry never grows here: entities pointing past the crawled range
/// or at an absent slot are logged and dropped.
pub fn merge_rankings(registry: &mut Registry, ranked: Vec<RankedEntity>) -> MergeReport {
    let mut report = MergeReport::default();
    let len = registry.len();

    for entity in ranked {
        if entity.id >= len {
            tracing::warn!("never fetched genealogy id: {}", entity.id);
            report.unreachable.push(entity.id);
            continue;
        }

        match registry.record_mut(entity.id) {
            Some(record) => {
                record.rank = Some(Rank {
                    wiki_id: entity.wiki_id,
                    score: entity.score,
                    wiki_link: entity.wiki_link,
                });
                report.merged += 1;
            }
            None => {
                tracing::warn!("genealogy id {} has no record to rank", entity.id);
                report.without_record.push(entity.id);
            }
        }
    }

    tracing::info!(
        "merged {} ranked entities ({} unreachable, {} without record)",
        report.merged,
        report.unreachable.len(),
        report.without_record.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Record, Slot};

    fn crawled() -> Registry {
        let mut registry = Registry::new();
        registry.ensure_capacity(6);
        for id in 1..6 {
            let outcome = (id % 2 == 1).then(|| Record {
                name: format!("Person {}", id),
                id,
                msn_id: None,
                descendants: vec![],
                degrees: vec![],
                rank: None,
            });
            registry.set(id, outcome).unwrap();
        }
        registry
    }

    fn entity(id: NodeId, wiki_id: u64) -> RankedEntity {
        RankedEntity {
            wiki_id,
            id,
            score: 10,
            wiki_link: Some(format!("https://en.example.org/{}", wiki_id)),
        }
    }

    #[test]
    fn test_merge_attaches_rank() {
        let mut registry = crawled();
        let report = merge_rankings(&mut registry, vec![entity(3, 77)]);

        assert_eq!(report.merged, 1);
        let rank = registry.get(3).and_then(Slot::record).and_then(|r| r.rank.clone());
        assert_eq!(
            rank,
            Some(Rank {
                wiki_id: 77,
                score: 10,
                wiki_link: Some("https://en.example.org/77".to_string())
            })
        );
    }

    #[test]
    fn test_out_of_range_entity_is_dropped() {
        let mut registry = crawled();
        let before = registry.clone();

        let report = merge_rankings(&mut registry, vec![entity(9, 1)]);

        assert_eq!(report.unreachable, vec![9]);
        assert_eq!(report.merged, 0);
        assert_eq!(registry, before);
    }

    #[test]
    fn test_absent_slot_is_not_ranked() {
        let mut registry = crawled();
        let report = merge_rankings(&mut registry, vec![entity(2, 5), entity(0, 6)]);

        assert_eq!(report.without_record, vec![2, 0]);
        assert_eq!(registry.get(2), Some(&Slot::Absent));
    }
}
