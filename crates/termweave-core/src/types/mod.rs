//! # Core Type Definitions
//!
//! This module contains the value types shared by every layer of Termweave:
//! - Identifiers (`PublicId`, `EntityRef`)
//! - STAMP coordinates (`Status`, `Timestamp`, `Stamp`)
//! - Structural kinds and the nesting table (`NodeKind`)
//! - Error types (`ComposerError`, `StoreError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they are used as `BTreeMap`/`BTreeSet` keys
//! - Compare entity references by public identity only

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable public identifier of an entity.
///
/// Public ids are issued by an `IdentityProvider` and never interpreted by
/// the composer; they are only stored, compared and forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicId(Uuid);

impl PublicId {
    /// Create a new random public id (UUID v4).
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a public id from a fixed 128-bit value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the raw 128-bit value.
    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an entity.
///
/// Carries the public id plus an optional human-readable description used
/// only for logs and debugging. Equality, ordering and hashing look at the
/// public id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    public_id: PublicId,
    description: Option<String>,
}

impl EntityRef {
    /// Create a reference with no description.
    #[must_use]
    pub const fn new(public_id: PublicId) -> Self {
        Self {
            public_id,
            description: None,
        }
    }

    /// Create a reference to an entity known by name.
    #[must_use]
    pub fn known(description: impl Into<String>, public_id: PublicId) -> Self {
        Self {
            public_id,
            description: Some(description.into()),
        }
    }

    /// Get the public id.
    #[must_use]
    pub const fn public_id(&self) -> PublicId {
        self.public_id
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.public_id == other.public_id
    }
}

impl Eq for EntityRef {}

impl PartialOrd for EntityRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.public_id.cmp(&other.public_id)
    }
}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.public_id.hash(state);
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(name) => write!(f, "{} ({})", name, self.public_id),
            None => write!(f, "{}", self.public_id),
        }
    }
}

// =============================================================================
// STAMP COORDINATE
// =============================================================================

/// Lifecycle status recorded on a version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Withdrawn,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Withdrawn => "withdrawn",
        };
        f.write_str(name)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Current wall-clock time.
    ///
    /// Returns the epoch if the system clock is before 1970.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
    }

    /// Create a timestamp from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Get the raw millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

/// The STAMP coordinate: status, time, author, module, path.
///
/// Every version written by one session carries the same `Stamp`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub status: Status,
    pub time: Timestamp,
    pub author: EntityRef,
    pub module: EntityRef,
    pub path: EntityRef,
}

impl Stamp {
    /// Create a new STAMP coordinate.
    #[must_use]
    pub fn new(
        status: Status,
        time: Timestamp,
        author: EntityRef,
        module: EntityRef,
        path: EntityRef,
    ) -> Self {
        Self {
            status,
            time,
            author,
            module,
            path,
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} @{} a={} m={} p={}]",
            self.status,
            self.time.as_millis(),
            self.author.public_id(),
            self.module.public_id(),
            self.path.public_id()
        )
    }
}

// =============================================================================
// STRUCTURAL KINDS
// =============================================================================

/// Structural tag of a node in an attachment tree.
///
/// The nesting table lives in [`NodeKind::accepts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Concept,
    FullyQualifiedName,
    Synonym,
    Definition,
    Dialect,
    Comment,
}

impl NodeKind {
    /// True for the description kinds (names and definitions).
    #[must_use]
    pub const fn is_description(self) -> bool {
        matches!(
            self,
            Self::FullyQualifiedName | Self::Synonym | Self::Definition
        )
    }

    /// Whether `child` may be attached directly beneath `self`.
    ///
    /// | parent      | children                          |
    /// |-------------|-----------------------------------|
    /// | Concept     | descriptions, Comment             |
    /// | description | Dialect, Comment                  |
    /// | Dialect     | Comment                           |
    /// | Comment     | Comment                           |
    #[must_use]
    pub const fn accepts(self, child: NodeKind) -> bool {
        match self {
            Self::Concept => child.is_description() || matches!(child, Self::Comment),
            Self::FullyQualifiedName | Self::Synonym | Self::Definition => {
                matches!(child, Self::Dialect | Self::Comment)
            }
            Self::Dialect | Self::Comment => matches!(child, Self::Comment),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Concept => "concept",
            Self::FullyQualifiedName => "fully qualified name",
            Self::Synonym => "synonym",
            Self::Definition => "definition",
            Self::Dialect => "dialect",
            Self::Comment => "comment",
        };
        f.write_str(name)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the entity store layer.
///
/// Store errors are never retried by the composer; they are surfaced to the
/// caller unchanged inside `ComposerError::StoreWriteFailure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An I/O or database error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A version with the same identity and stamp already exists.
    #[error("Duplicate version for {0}")]
    DuplicateVersion(PublicId),

    /// A batch exceeded the maximum commit size.
    #[error("Batch of {len} records exceeds maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// The store configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while composing or committing a session.
///
/// Usage errors are local and synchronous: they fail the current call and
/// leave already-attached state untouched.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// A concept identity was registered twice in one session.
    #[error("Identity collision: {0} is already registered in this session")]
    IdentityCollision(PublicId),

    /// A constituent identity already has a parent in this session.
    #[error("Already attached: {0} already has a parent")]
    AlreadyAttached(PublicId),

    /// The child kind may not be nested under the parent kind.
    #[error("Invalid nesting: a {child} cannot be attached to a {parent}")]
    InvalidNesting { parent: NodeKind, child: NodeKind },

    /// A constituent tree would nest deeper than `MAX_NESTING_DEPTH`.
    #[error("Nesting too deep: depth {depth} exceeds maximum of {max}")]
    TooDeep { depth: usize, max: usize },

    /// The session's pending set would exceed `MAX_BATCH_LEN` entities.
    #[error("Session full: {len} pending entities would exceed maximum of {max}")]
    BatchFull { len: usize, max: usize },

    /// Description or comment text violates a structural constraint.
    #[error("Invalid text: {0}")]
    InvalidText(String),

    /// The session has already been closed.
    #[error("Session closed")]
    SessionClosed,

    /// The entity store rejected the commit.
    #[error("Store write failure: {0}")]
    StoreWriteFailure(#[from] StoreError),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_equality_ignores_description() {
        let id = PublicId::from_u128(7);
        let named = EntityRef::known("Seven", id);
        let bare = EntityRef::new(id);

        assert_eq!(named, bare);
        assert_eq!(named.description(), Some("Seven"));
        assert_eq!(bare.description(), None);
    }

    #[test]
    fn public_id_roundtrips_through_u128() {
        let id = PublicId::new_random();
        assert_eq!(PublicId::from_u128(id.as_u128()), id);
    }

    #[test]
    fn timestamp_from_millis() {
        let t = Timestamp::from_millis(1_700_000_000_000);
        assert_eq!(t.as_millis(), 1_700_000_000_000);
        assert!(Timestamp::now() > Timestamp::EPOCH);
    }

    #[test]
    fn concept_accepts_descriptions_and_comments_only() {
        assert!(NodeKind::Concept.accepts(NodeKind::FullyQualifiedName));
        assert!(NodeKind::Concept.accepts(NodeKind::Synonym));
        assert!(NodeKind::Concept.accepts(NodeKind::Definition));
        assert!(NodeKind::Concept.accepts(NodeKind::Comment));
        assert!(!NodeKind::Concept.accepts(NodeKind::Dialect));
        assert!(!NodeKind::Concept.accepts(NodeKind::Concept));
    }

    #[test]
    fn descriptions_accept_dialects_and_comments() {
        for parent in [
            NodeKind::FullyQualifiedName,
            NodeKind::Synonym,
            NodeKind::Definition,
        ] {
            assert!(parent.accepts(NodeKind::Dialect));
            assert!(parent.accepts(NodeKind::Comment));
            assert!(!parent.accepts(NodeKind::Synonym));
        }
    }

    #[test]
    fn leaves_accept_only_comments() {
        assert!(NodeKind::Dialect.accepts(NodeKind::Comment));
        assert!(!NodeKind::Dialect.accepts(NodeKind::Dialect));
        assert!(NodeKind::Comment.accepts(NodeKind::Comment));
        assert!(!NodeKind::Comment.accepts(NodeKind::FullyQualifiedName));
    }

    #[test]
    fn invalid_nesting_message_names_both_kinds() {
        let err = ComposerError::InvalidNesting {
            parent: NodeKind::Concept,
            child: NodeKind::Dialect,
        };
        assert_eq!(
            err.to_string(),
            "Invalid nesting: a dialect cannot be attached to a concept"
        );
    }

    #[test]
    fn store_error_converts_into_composer_error() {
        let err: ComposerError = StoreError::Io("disk full".to_string()).into();
        assert!(matches!(
            err,
            ComposerError::StoreWriteFailure(StoreError::Io(_))
        ));
    }
}
