//! # termweave-core
//!
//! Session-scoped composition of STAMP-versioned terminology graphs.
//!
//! A [`Session`] fixes one STAMP coordinate (status, time, author, module,
//! path). Its [`Composer`] registers concepts and anchors trees of
//! [`Constituent`]s under them: fully qualified names, synonyms,
//! definitions, dialect acceptability markers and comments. Closing the
//! session stamps every reachable entity and commits the whole set to an
//! [`EntityStore`] as one atomic batch.
//!
//! ```
//! use termweave_core::{
//!     Constituent, EphemeralStore, EntityStore, IdentityProvider, RandomIdentities, Session,
//!     Stamp, Status, Timestamp, terms,
//! };
//!
//! # fn main() -> Result<(), termweave_core::ComposerError> {
//! let ids = RandomIdentities::new();
//! let store = EphemeralStore::new();
//! let stamp = Stamp::new(
//!     Status::Active,
//!     Timestamp::now(),
//!     terms::user(),
//!     terms::development_module(),
//!     terms::development_path(),
//! );
//!
//! let mut session = Session::open(stamp, &store);
//! session
//!     .make_compose()?
//!     .concept(ids.issue_named("Heart"))?
//!     .with(
//!         Constituent::fully_qualified_name(
//!             ids.issue_identity(),
//!             terms::english_language(),
//!             "Heart structure",
//!             terms::description_not_case_sensitive(),
//!         )?
//!         .with(Constituent::us_english_dialect(ids.issue_identity(), terms::preferred())?)?,
//!     )?;
//! let summary = session.close()?;
//!
//! assert_eq!(summary.records, 3);
//! assert_eq!(store.version_count()?, 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architectural Constraints
//!
//! - Identity issuing and storage are external, reached through
//!   [`IdentityProvider`] and [`EntityStore`]
//! - Only entities reachable from a registered concept are committed
//! - One session, one stamp, one atomic commit
//! - No async, no network dependencies

// =============================================================================
// MODULES
// =============================================================================

pub mod composer;
pub mod config;
pub mod constituent;
pub mod identity;
pub mod limits;
pub mod record;
pub mod session;
pub mod storage;
pub mod terms;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ComposerError, EntityRef, NodeKind, PublicId, Stamp, Status, StoreError, Timestamp,
};

// =============================================================================
// RE-EXPORTS: Composition
// =============================================================================

pub use composer::{Composer, Concept, ConceptBuilder};
pub use constituent::{
    Comment, Constituent, ConstituentData, Description, DialectAcceptability, IntoConstituents,
};
pub use identity::{IdentityProvider, RandomIdentities};
pub use session::{CommitSummary, Session, SessionState};

// =============================================================================
// RE-EXPORTS: Storage and Configuration
// =============================================================================

pub use config::{BackendKind, StoreConfig};
pub use record::{Payload, VersionRecord, decode_record, encode_record};
pub use storage::{EntityStore, EphemeralStore, RedbStore, StoreBackend};
