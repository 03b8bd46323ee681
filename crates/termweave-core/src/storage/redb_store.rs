//! # redb-backed Entity Store
//!
//! A disk-backed version store using the redb embedded database, providing:
//! - ACID transactions (one write transaction per batch)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! ## Layout
//!
//! - `versions`: `(public_id as u128, sequence)` -> encoded `VersionRecord`
//! - `metadata`: `"version_count"` -> total number of versions
//!
//! The sequence number is the per-entity append position, so a range scan
//! over one public id returns its versions oldest first.

use super::{EntityStore, first_duplicate_in_batch};
use crate::limits::MAX_BATCH_LEN;
use crate::record::{VersionRecord, decode_record, encode_record};
use crate::{PublicId, StoreError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for versions: (public_id, sequence) -> encoded record bytes
const VERSIONS: TableDefinition<(u128, u64), &[u8]> = TableDefinition::new("versions");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const VERSION_COUNT_KEY: &str = "version_count";

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Io(e.to_string())
}

/// A disk-backed entity store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a version database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(VERSIONS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        tracing::debug!(path = %path.as_ref().display(), "opened redb store");
        Ok(Self { db })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), StoreError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

impl EntityStore for RedbStore {
    /// Write a batch in a single redb transaction.
    ///
    /// Records are encoded before the transaction opens. Any failure inside
    /// the transaction drops it uncommitted, so nothing from the batch
    /// becomes visible.
    fn commit_batch(&self, records: Vec<VersionRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        if records.len() > MAX_BATCH_LEN {
            return Err(StoreError::BatchTooLarge {
                len: records.len(),
                max: MAX_BATCH_LEN,
            });
        }
        if let Some(id) = first_duplicate_in_batch(&records) {
            return Err(StoreError::DuplicateVersion(id));
        }

        let encoded = records
            .iter()
            .map(encode_record)
            .collect::<Result<Vec<_>, _>>()?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut versions_table = write_txn.open_table(VERSIONS).map_err(io_err)?;
            let mut meta_table = write_txn.open_table(METADATA).map_err(io_err)?;

            for (record, bytes) in records.iter().zip(&encoded) {
                let key = record.public_id().as_u128();

                // Existing versions, including ones written earlier in this batch.
                let mut sequence = 0u64;
                for entry in versions_table
                    .range((key, 0u64)..=(key, u64::MAX))
                    .map_err(io_err)?
                {
                    let (_, value) = entry.map_err(io_err)?;
                    let existing = decode_record(value.value())?;
                    if existing.stamp == record.stamp {
                        return Err(StoreError::DuplicateVersion(record.public_id()));
                    }
                    sequence = sequence.saturating_add(1);
                }

                versions_table
                    .insert((key, sequence), bytes.as_slice())
                    .map_err(io_err)?;
            }

            let current = meta_table
                .get(VERSION_COUNT_KEY)
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(0);
            meta_table
                .insert(
                    VERSION_COUNT_KEY,
                    current.saturating_add(records.len() as u64),
                )
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        tracing::debug!(records = records.len(), "redb batch committed");
        Ok(())
    }

    fn versions(&self, public_id: PublicId) -> Result<Vec<VersionRecord>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let versions_table = read_txn.open_table(VERSIONS).map_err(io_err)?;

        let key = public_id.as_u128();
        let mut records = Vec::new();
        for entry in versions_table
            .range((key, 0u64)..=(key, u64::MAX))
            .map_err(io_err)?
        {
            let (_, value) = entry.map_err(io_err)?;
            records.push(decode_record(value.value())?);
        }
        Ok(records)
    }

    fn version_count(&self) -> Result<usize, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let meta_table = read_txn.open_table(METADATA).map_err(io_err)?;
        let count = meta_table
            .get(VERSION_COUNT_KEY)
            .map_err(io_err)?
            .map(|v| v.value())
            .unwrap_or(0);
        Ok(count as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
