//! # Ephemeral Store
//!
//! In-memory entity store. Versions live in a `BTreeMap` keyed by public id
//! for deterministic iteration, behind a single `RwLock` so a batch is
//! validated and applied under one write guard.

use super::{EntityStore, first_duplicate_in_batch};
use crate::limits::MAX_BATCH_LEN;
use crate::record::VersionRecord;
use crate::{PublicId, StoreError};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Volatile in-memory store.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    /// Versions per entity, oldest first.
    versions: RwLock<BTreeMap<PublicId, Vec<VersionRecord>>>,
}

impl EphemeralStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct entities with at least one version.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.versions.read().len()
    }

    /// Snapshot of every stored version, grouped by entity in id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<VersionRecord> {
        self.versions
            .read()
            .values()
            .flat_map(|records| records.iter().cloned())
            .collect()
    }
}

impl EntityStore for EphemeralStore {
    fn commit_batch(&self, records: Vec<VersionRecord>) -> Result<(), StoreError> {
        if records.len() > MAX_BATCH_LEN {
            return Err(StoreError::BatchTooLarge {
                len: records.len(),
                max: MAX_BATCH_LEN,
            });
        }
        if let Some(id) = first_duplicate_in_batch(&records) {
            return Err(StoreError::DuplicateVersion(id));
        }

        let mut versions = self.versions.write();

        // Validate everything before touching the map.
        for record in &records {
            let exists = versions
                .get(&record.public_id())
                .is_some_and(|existing| existing.iter().any(|v| v.stamp == record.stamp));
            if exists {
                return Err(StoreError::DuplicateVersion(record.public_id()));
            }
        }

        for record in records {
            versions.entry(record.public_id()).or_default().push(record);
        }
        Ok(())
    }

    fn versions(&self, public_id: PublicId) -> Result<Vec<VersionRecord>, StoreError> {
        Ok(self
            .versions
            .read()
            .get(&public_id)
            .cloned()
            .unwrap_or_default())
    }

    fn version_count(&self) -> Result<usize, StoreError> {
        Ok(self.versions.read().values().map(Vec::len).sum())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Payload;
    use crate::{EntityRef, Stamp, Status, Timestamp, terms};

    fn record(id: u128, time: i64) -> VersionRecord {
        VersionRecord {
            identity: EntityRef::new(PublicId::from_u128(id)),
            stamp: Stamp::new(
                Status::Active,
                Timestamp::from_millis(time),
                terms::user(),
                terms::development_module(),
                terms::development_path(),
            ),
            payload: Payload::Concept { children: vec![] },
        }
    }

    #[test]
    fn batch_is_visible_after_commit() {
        let store = EphemeralStore::new();
        store
            .commit_batch(vec![record(1, 5), record(2, 5)])
            .expect("commit");

        assert_eq!(store.version_count().expect("count"), 2);
        assert_eq!(store.entity_count(), 2);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn failing_batch_leaves_nothing_visible() {
        let store = EphemeralStore::new();
        store.write_version(record(1, 5)).expect("seed");

        // Record 2 is new, record 1 repeats an existing (identity, stamp).
        let result = store.commit_batch(vec![record(2, 5), record(1, 5)]);

        assert_eq!(
            result,
            Err(StoreError::DuplicateVersion(PublicId::from_u128(1)))
        );
        assert!(store.versions(PublicId::from_u128(2)).expect("read").is_empty());
        assert_eq!(store.version_count().expect("count"), 1);
    }

    #[test]
    fn versions_are_appended_oldest_first() {
        let store = EphemeralStore::new();
        store.write_version(record(1, 5)).expect("v1");
        store.write_version(record(1, 9)).expect("v2");

        let times: Vec<_> = store
            .versions(PublicId::from_u128(1))
            .expect("read")
            .iter()
            .map(|r| r.stamp.time.as_millis())
            .collect();
        assert_eq!(times, vec![5, 9]);
    }

    #[test]
    fn unknown_entity_has_no_versions() {
        let store = EphemeralStore::new();
        assert!(store.versions(PublicId::from_u128(99)).expect("read").is_empty());
    }

    #[test]
    fn oversized_batch_rejected_before_any_write() {
        let store = EphemeralStore::new();
        let batch = vec![record(1, 5); MAX_BATCH_LEN + 1];

        let result = store.commit_batch(batch);

        assert_eq!(
            result,
            Err(StoreError::BatchTooLarge {
                len: MAX_BATCH_LEN + 1,
                max: MAX_BATCH_LEN,
            })
        );
        assert_eq!(store.version_count().expect("count"), 0);
    }
}
