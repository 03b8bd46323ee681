//! # Entity Storage
//!
//! The append-only store that receives committed versions.
//!
//! The store is an external collaborator: the composer only needs the
//! [`EntityStore`] trait. Two implementations ship with the core:
//! - `EphemeralStore`: in-memory, volatile
//! - `RedbStore`: disk-backed ACID storage via redb
//!
//! [`StoreBackend`] selects between them at runtime (see `StoreConfig`).

mod ephemeral;
mod redb_store;

pub use ephemeral::EphemeralStore;
pub use redb_store::RedbStore;

use crate::record::VersionRecord;
use crate::{PublicId, Stamp, StoreError};

/// Append-only store of versioned entity records.
///
/// Methods take `&self`; implementations serialize concurrent commits
/// themselves, so several sessions may share one store.
pub trait EntityStore {
    /// Write every record as one atomic unit.
    ///
    /// Either all records become visible or none do. Fails with
    /// `DuplicateVersion` if any record repeats an (identity, stamp) pair
    /// already stored or already earlier in the batch.
    fn commit_batch(&self, records: Vec<VersionRecord>) -> Result<(), StoreError>;

    /// All stored versions of one entity, oldest first.
    fn versions(&self, public_id: PublicId) -> Result<Vec<VersionRecord>, StoreError>;

    /// Total number of stored versions.
    fn version_count(&self) -> Result<usize, StoreError>;

    /// Write a single version.
    fn write_version(&self, record: VersionRecord) -> Result<(), StoreError> {
        self.commit_batch(vec![record])
    }

    /// The version of an entity written with `stamp`, if any.
    fn version_at(
        &self,
        public_id: PublicId,
        stamp: &Stamp,
    ) -> Result<Option<VersionRecord>, StoreError> {
        Ok(self
            .versions(public_id)?
            .into_iter()
            .find(|record| &record.stamp == stamp))
    }
}

/// Runtime-selected entity store.
#[derive(Debug)]
pub enum StoreBackend {
    /// In-memory store (fast, volatile).
    Ephemeral(EphemeralStore),
    /// Disk-backed store using redb (ACID, persistent).
    Redb(RedbStore),
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Ephemeral(EphemeralStore::new())
    }
}

impl StoreBackend {
    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Redb(_))
    }
}

impl EntityStore for StoreBackend {
    fn commit_batch(&self, records: Vec<VersionRecord>) -> Result<(), StoreError> {
        match self {
            Self::Ephemeral(store) => store.commit_batch(records),
            Self::Redb(store) => store.commit_batch(records),
        }
    }

    fn versions(&self, public_id: PublicId) -> Result<Vec<VersionRecord>, StoreError> {
        match self {
            Self::Ephemeral(store) => store.versions(public_id),
            Self::Redb(store) => store.versions(public_id),
        }
    }

    fn version_count(&self) -> Result<usize, StoreError> {
        match self {
            Self::Ephemeral(store) => store.version_count(),
            Self::Redb(store) => store.version_count(),
        }
    }
}

/// Find the first record that repeats an (identity, stamp) pair within a batch.
pub(crate) fn first_duplicate_in_batch(records: &[VersionRecord]) -> Option<PublicId> {
    let mut seen = std::collections::BTreeSet::new();
    records
        .iter()
        .find(|record| !seen.insert((record.public_id(), &record.stamp)))
        .map(VersionRecord::public_id)
}

// =============================================================================
// TESTS
// =============================================================================
