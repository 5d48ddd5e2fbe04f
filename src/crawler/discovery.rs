//! Discovery and fan-out
//!
//! When a fetch resolves, its outcome is written into the registry and every
//! id the record references is made reachable by growing the registry to
//! cover the highest one. The ids created by that growth are returned for the
//! caller to schedule, so each id is handed out exactly once per run.
//!
//! All of this runs synchronously on the task that owns the registry, so a
//! capacity check and the slot creation it implies can never interleave with
//! another fan-out.

use crate::state::{NodeId, Record, Registry};
use crate::HarvestError;
use std::ops::Range;

/// Highest id a record may reference; the live directory is far below this
pub const MAX_NODE_ID: NodeId = 10_000_000;

/// Resolves `id` with `outcome` and grows the registry for its references
///
/// Returns the newly created ids; empty when the outcome is absent, the
/// record references nothing, or every referenced id is already covered.
/// A reference above `MAX_NODE_ID` is an extraction error and leaves the
/// slot pending.
pub fn resolve_and_fan_out(
    registry: &mut Registry,
    id: NodeId,
    outcome: Option<Record>,
) -> Result<Range<NodeId>, HarvestError> {
    let required_len = match outcome.as_ref().and_then(Record::max_referenced_id) {
        Some(max) if max > MAX_NODE_ID => {
            return Err(HarvestError::Extraction {
                id,
                message: format!("referenced id {} exceeds {}", max, MAX_NODE_ID),
            })
        }
        Some(max) => Some(max + 1),
        None => None,
    };

    registry.set(id, outcome)?;

    let created = match required_len {
        Some(len) => registry.ensure_capacity(len),
        None => registry.len()..registry.len(),
    };

    if !created.is_empty() {
        tracing::debug!(
            "record {} extended the registry to {} slots ({} new)",
            id,
            registry.len(),
            created.len()
        );
    }

    Ok(created)
}
