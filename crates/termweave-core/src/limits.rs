//! # Limits and Format Constants
//!
//! Hardcoded constants for the Termweave core.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! They bound the size of what one session may compose and commit, and fix
//! the on-disk record header.

/// Maximum length in bytes of description and comment text.
///
/// Text longer than this is rejected when the constituent is built.
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Maximum number of version records in a single batch commit.
///
/// Stores reject larger batches before opening a write transaction, and a
/// composer refuses work that would grow its pending set past this.
pub const MAX_BATCH_LEN: usize = 100_000;

/// Maximum depth of a constituent tree, counting its root as 1.
///
/// - Comment chains may nest arbitrarily, so depth must be bounded.
/// - Every tree walk stays within this bound.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Magic bytes prefixed to every encoded version record.
pub const RECORD_MAGIC: &[u8; 3] = b"TWV";

/// Current record encoding version.
///
/// Increment this when making breaking changes to `VersionRecord`.
pub const RECORD_FORMAT_VERSION: u8 = 1;

/// Length of the record header (magic + version byte).
pub const RECORD_HEADER_LEN: usize = 4;
