use crate::state::{NodeId, Record, Slot};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Range;
use thiserror::Error;

/// Errors from misusing the registry's slot state machine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Node {id} is outside the registry (length {len})")]
    OutOfRange { id: NodeId, len: usize },

    #[error("Node {id} is already resolved ({state})")]
    AlreadyResolved { id: NodeId, state: &'static str },
}

/// Dense, growable store of per-id slots
///
/// Index 0 is a sentinel that is always `Absent`; real ids start at 1. The
/// registry only grows, and it grows contiguously, so every index below
/// `len()` is either pending or resolved: there are no holes to forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    slots: Vec<Slot>,
    /// Resolved slots excluding the sentinel
    resolved: usize,
}

impl Registry {
    /// A fresh registry: the sentinel plus a pending slot for id 1
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::Absent, Slot::Pending],
            resolved: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Never true: the sentinel is always present
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id)
    }

    /// Mutable access to the record at `id`, if that slot is present
    pub fn record_mut(&mut self, id: NodeId) -> Option<&mut Record> {
        self.slots.get_mut(id).and_then(Slot::record_mut)
    }

    /// Grows the registry so it holds at least `required_len` slots
    ///
    /// Every new slot starts `Pending`. Returns the newly created ids, which
    /// the caller now owns the duty of fetching. Calling with a length at or
    /// below the current one creates nothing.
    pub fn ensure_capacity(&mut self, required_len: usize) -> Range<NodeId> {
        let start = self.slots.len();
        if required_len > start {
            self.slots.resize(required_len, Slot::Pending);
            start..required_len
        } else {
            start..start
        }
    }

    /// Resolves a pending slot to absent (`None`) or present (`Some`)
    pub fn set(&mut self, id: NodeId, outcome: Option<Record>) -> Result<(), RegistryError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(id)
            .ok_or(RegistryError::OutOfRange { id, len })?;

        if slot.is_resolved() {
            return Err(RegistryError::AlreadyResolved {
                id,
                state: slot.state_name(),
            });
        }

        *slot = Slot::from(outcome);
        self.resolved += 1;
        Ok(())
    }

    /// Ids still waiting for a fetch, in ascending order
    pub fn pending_ids(&self) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_pending())
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of resolved slots, not counting the sentinel
    pub fn resolved_count(&self) -> usize {
        self.resolved
    }

    /// Number of slots holding a record
    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.record().is_some()).count()
    }

    /// True once no slot is pending
    pub fn is_complete(&self) -> bool {
        self.resolved + 1 == self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Slot)> {
        self.slots.iter().enumerate()
    }

    /// Present records in id order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().filter_map(Slot::record)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Slot>> for Registry {
    /// Restores a registry from snapshot slots, re-establishing the sentinel
    /// and the pending id 1 if the slots are too short to contain them.
    fn from(mut slots: Vec<Slot>) -> Self {
        match slots.first_mut() {
            Some(sentinel) => *sentinel = Slot::Absent,
            None => slots.push(Slot::Absent),
        }
        if slots.len() < 2 {
            slots.push(Slot::Pending);
        }
        let resolved = slots.iter().skip(1).filter(|slot| slot.is_resolved()).count();
        Self { slots, resolved }
    }
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slots.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Registry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Slot>::deserialize(deserializer).map(Registry::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: NodeId) -> Record {
        Record {
            name: format!("Person {}", id),
            id,
            msn_id: None,
            descendants: vec![],
            degrees: vec![],
            rank: None,
        }
    }

    #[test]
    fn test_new_registry_has_sentinel_and_seed() {
        let registry = Registry::new();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0), Some(&Slot::Absent));
        assert_eq!(registry.get(1), Some(&Slot::Pending));
        assert_eq!(registry.pending_ids(), vec![1]);
        assert!(!registry.is_complete());
    }

    #[test]
    fn test_ensure_capacity_creates_contiguous_pending_slots() {
        let mut registry = Registry::new();
        let created = registry.ensure_capacity(6);
        assert_eq!(created, 2..6);
        assert_eq!(registry.len(), 6);
        assert!((2..6).all(|id| registry.get(id) == Some(&Slot::Pending)));
    }

    #[test]
    fn test_ensure_capacity_never_recreates_slots() {
        let mut registry = Registry::new();
        assert_eq!(registry.ensure_capacity(5), 2..5);
        assert!(registry.ensure_capacity(3).is_empty());
        assert!(registry.ensure_capacity(5).is_empty());
        assert_eq!(registry.ensure_capacity(7), 5..7);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_set_resolves_pending_slot() {
        let mut registry = Registry::new();
        registry.ensure_capacity(3);
        registry.set(1, Some(record(1))).unwrap();
        registry.set(2, None).unwrap();

        assert_eq!(registry.get(1), Some(&Slot::Present(record(1))));
        assert_eq!(registry.get(2), Some(&Slot::Absent));
        assert!(registry.is_complete());
        assert_eq!(registry.resolved_count(), 2);
        assert_eq!(registry.present_count(), 1);
    }

    #[test]
    fn test_set_rejects_resolved_slot() {
        let mut registry = Registry::new();
        registry.set(1, None).unwrap();
        assert_eq!(
            registry.set(1, Some(record(1))),
            Err(RegistryError::AlreadyResolved {
                id: 1,
                state: "absent"
            })
        );
        assert!(matches!(
            registry.set(0, None),
            Err(RegistryError::AlreadyResolved { id: 0, .. })
        ));
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.set(9, None),
            Err(RegistryError::OutOfRange { id: 9, len: 2 })
        );
    }

    #[test]
    fn test_restore_from_short_slots() {
        assert_eq!(Registry::from(Vec::new()), Registry::new());
        assert_eq!(Registry::from(vec![Slot::Pending]), Registry::new());
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_pending() {
        let mut registry = Registry::new();
        registry.ensure_capacity(4);
        registry.set(1, Some(record(1))).unwrap();
        registry.set(3, None).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let restored: Registry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, registry);
        assert_eq!(restored.pending_ids(), vec![2]);
    }

    #[test]
    fn test_resolved_count_survives_restore() {
        let restored = Registry::from(vec![
            Slot::Pending,
            Slot::Absent,
            Slot::Present(record(2)),
            Slot::Pending,
            Slot::Absent,
        ]);
        assert_eq!(restored.get(0), Some(&Slot::Absent));
        assert_eq!(restored.resolved_count(), 3);
        assert!(!restored.is_complete());

        let mut restored = restored;
        restored.set(3, None).unwrap();
        assert_eq!(restored.resolved_count(), 4);
        assert!(restored.is_complete());
    }
}
