//! # Session Module
//!
//! Transactional scope binding one STAMP coordinate to one batch of
//! composed entities.
//!
//! Lifecycle: `Open -> Closed`, exactly once.
//! - While open, the session's single `Composer` registers concepts and
//!   anchors constituent trees
//! - `close()` stamps every reachable entity and hands the records to the
//!   entity store as one atomic batch
//! - Dropping an open session discards its pending work, like an
//!   uncommitted write transaction
//!
//! [`Session::scope`] pairs open and close around a closure: `Ok` commits,
//! `Err` discards.

use crate::composer::{Composer, Concept};
use crate::constituent::Constituent;
use crate::record::{Payload, VersionRecord};
use crate::storage::EntityStore;
use crate::{ComposerError, PublicId, Stamp};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitSummary {
    /// Version records written.
    pub records: usize,
    /// Concept trees written.
    pub concepts: usize,
}

/// A composition session against an entity store.
///
/// Session does NOT implement Clone: the pending set is consumed exactly once.
pub struct Session<'s, S: EntityStore + ?Sized> {
    store: &'s S,
    composer: Composer,
    state: SessionState,
}

impl<S: EntityStore + ?Sized> std::fmt::Debug for Session<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("stamp", self.composer.stamp())
            .field("state", &self.state)
            .field("pending", &self.composer.pending_len())
            .finish_non_exhaustive()
    }
}

impl<'s, S: EntityStore + ?Sized> Session<'s, S> {
    /// Open a session that will stamp everything with `stamp`.
    pub fn open(stamp: Stamp, store: &'s S) -> Self {
        tracing::debug!(stamp = %stamp, "session opened");
        Self {
            store,
            composer: Composer::new(stamp),
            state: SessionState::Open,
        }
    }

    /// Run `compose` inside a session and close it.
    ///
    /// Commits if `compose` returns `Ok`, discards everything if it returns
    /// `Err`, and propagates the error.
    pub fn scope<T, F>(
        stamp: Stamp,
        store: &'s S,
        compose: F,
    ) -> Result<(T, CommitSummary), ComposerError>
    where
        F: FnOnce(&mut Composer) -> Result<T, ComposerError>,
    {
        let mut session = Self::open(stamp, store);
        match compose(&mut session.composer) {
            Ok(value) => {
                let summary = session.close()?;
                Ok((value, summary))
            }
            Err(e) => {
                let discarded = session.discard()?;
                tracing::warn!(error = %e, discarded, "composition failed, session discarded");
                Err(e)
            }
        }
    }

    /// The session's STAMP coordinate.
    #[must_use]
    pub fn stamp(&self) -> &Stamp {
        self.composer.stamp()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Get the session's composer.
    ///
    /// Every call returns the same composer, so all work aggregates into one
    /// pending set.
    pub fn make_compose(&mut self) -> Result<&mut Composer, ComposerError> {
        self.ensure_open()?;
        Ok(&mut self.composer)
    }

    /// Stamp and commit every pending entity, then close.
    ///
    /// The pending set is consumed even if the store rejects the batch; a
    /// rejected batch leaves nothing visible in the store.
    pub fn close(&mut self) -> Result<CommitSummary, ComposerError> {
        self.ensure_open()?;
        self.state = SessionState::Closed;

        if self.composer.had_usage_error() {
            tracing::warn!("committing session that saw composition errors");
        }

        let concepts = self.composer.drain();
        let records = stamp_records(self.composer.stamp(), &concepts);
        let summary = CommitSummary {
            records: records.len(),
            concepts: concepts.len(),
        };

        if let Err(e) = self.store.commit_batch(records) {
            tracing::error!(error = %e, records = summary.records, "session commit failed");
            return Err(ComposerError::StoreWriteFailure(e));
        }

        tracing::info!(
            records = summary.records,
            concepts = summary.concepts,
            stamp = %self.composer.stamp(),
            "session committed"
        );
        Ok(summary)
    }

    /// Close without committing. Returns the number of entities dropped.
    pub fn discard(&mut self) -> Result<usize, ComposerError> {
        self.ensure_open()?;
        self.state = SessionState::Closed;
        let dropped = self.composer.pending_len();
        self.composer.drain();
        Ok(dropped)
    }

    fn ensure_open(&self) -> Result<(), ComposerError> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(ComposerError::SessionClosed),
        }
    }
}

impl<S: EntityStore + ?Sized> Drop for Session<'_, S> {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            let pending = self.composer.pending_len();
            self.state = SessionState::Closed;
            self.composer.drain();
            if pending > 0 {
                tracing::warn!(pending, "session dropped while open, pending work discarded");
            }
        }
    }
}

// =============================================================================
// STAMPING
// =============================================================================

/// Flatten concept trees into stamped records.
///
/// Concepts in registration order; each concept before its constituents,
/// each constituent before its own children.
fn stamp_records(stamp: &Stamp, concepts: &[Concept]) -> Vec<VersionRecord> {
    let mut records = Vec::with_capacity(concepts.iter().map(Concept::tree_len).sum());
    for concept in concepts {
        records.push(VersionRecord {
            identity: concept.identity().clone(),
            stamp: stamp.clone(),
            payload: Payload::Concept {
                children: child_ids(concept.children()),
            },
        });

        // Explicit stack of (constituent, parent id), reversed so pops
        // come out in pre-order.
        let mut stack: Vec<(&Constituent, PublicId)> = concept
            .children()
            .iter()
            .rev()
            .map(|child| (child, concept.public_id()))
            .collect();
        while let Some((constituent, referenced_component)) = stack.pop() {
            records.push(VersionRecord {
                identity: constituent.identity().clone(),
                stamp: stamp.clone(),
                payload: Payload::Constituent {
                    data: constituent.data().clone(),
                    referenced_component,
                    children: child_ids(constituent.children()),
                },
            });
            stack.extend(
                constituent
                    .children()
                    .iter()
                    .rev()
                    .map(|child| (child, constituent.public_id())),
            );
        }
    }
    records
}

fn child_ids(children: &[Constituent]) -> Vec<PublicId> {
    children.iter().map(Constituent::public_id).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityProvider, RandomIdentities};
    use crate::limits::{MAX_BATCH_LEN, MAX_NESTING_DEPTH};
    use crate::storage::EphemeralStore;
    use crate::{EntityRef, NodeKind, Status, StoreError, Timestamp, terms};

    fn stamp() -> Stamp {
        let ids = RandomIdentities::new();
        Stamp::new(
            Status::Active,
            Timestamp::from_millis(1_700_000_000_000),
            ids.issue_identity(),
            ids.issue_identity(),
            ids.issue_identity(),
        )
    }

    fn fqn(identity: EntityRef, text: &str) -> Constituent {
        Constituent::fully_qualified_name(
            identity,
            terms::english_language(),
            text,
            terms::description_not_case_sensitive(),
        )
        .expect("fqn")
    }

    #[test]
    fn close_commits_concept_and_nested_comment() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let stamp = stamp();
        let c1 = ids.issue_named("C1");
        let f1 = ids.issue_named("F1");
        let comment = ids.issue_named("c1");

        let mut session = Session::open(stamp.clone(), &store);
        session
            .make_compose()
            .expect("compose")
            .concept(c1.clone())
            .expect("concept")
            .with(
                fqn(f1.clone(), "FQN1")
                    .with(Constituent::comment(comment.clone(), "c1").expect("comment"))
                    .expect("nest"),
            )
            .expect("attach");
        let summary = session.close().expect("close");

        assert_eq!(summary, CommitSummary { records: 3, concepts: 1 });

        let concept = store.version_at(c1.public_id(), &stamp).expect("read");
        let concept = concept.expect("concept version");
        assert_eq!(concept.children(), &[f1.public_id()]);

        let name = store
            .version_at(f1.public_id(), &stamp)
            .expect("read")
            .expect("fqn version");
        assert_eq!(name.kind(), NodeKind::FullyQualifiedName);
        assert_eq!(name.children(), &[comment.public_id()]);
        assert_eq!(name.referenced_component(), Some(c1.public_id()));
        assert_eq!(name.stamp, concept.stamp);
    }

    #[test]
    fn make_compose_returns_same_composer() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let mut session = Session::open(stamp(), &store);

        session
            .make_compose()
            .expect("first")
            .concept(ids.issue_identity())
            .expect("concept");
        let composer = session.make_compose().expect("second");

        assert_eq!(composer.concept_count(), 1);
    }

    #[test]
    fn composition_after_close_fails() {
        let store = EphemeralStore::new();
        let mut session = Session::open(stamp(), &store);
        session.close().expect("close");

        assert!(!session.is_open());
        assert!(matches!(
            session.make_compose(),
            Err(ComposerError::SessionClosed)
        ));
        assert!(matches!(session.close(), Err(ComposerError::SessionClosed)));
    }

    #[test]
    fn dropped_session_commits_nothing() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        {
            let mut session = Session::open(stamp(), &store);
            session
                .make_compose()
                .expect("compose")
                .concept(ids.issue_identity())
                .expect("concept");
        }
        assert_eq!(store.version_count().expect("count"), 0);
    }

    #[test]
    fn scope_commits_on_ok() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();

        let (concept, summary) = Session::scope(stamp(), &store, |composer| {
            let concept = ids.issue_identity();
            composer.concept(concept.clone())?;
            Ok(concept)
        })
        .expect("scope");

        assert_eq!(summary.records, 1);
        assert_eq!(store.versions(concept.public_id()).expect("read").len(), 1);
    }

    #[test]
    fn scope_discards_on_err() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let concept = ids.issue_identity();

        let result = Session::scope(stamp(), &store, |composer| {
            composer.concept(concept.clone())?;
            composer.concept(concept.clone())?;
            Ok(())
        });

        assert!(matches!(result, Err(ComposerError::IdentityCollision(_))));
        assert_eq!(store.version_count().expect("count"), 0);
    }

    #[test]
    fn store_rejection_surfaces_and_closes() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let stamp = stamp();
        let concept = ids.issue_identity();

        Session::scope(stamp.clone(), &store, |composer| {
            composer.concept(concept.clone())?;
            Ok(())
        })
        .expect("first session");

        let mut second = Session::open(stamp, &store);
        second
            .make_compose()
            .expect("compose")
            .concept(concept.clone())
            .expect("concept");
        let result = second.close();

        assert!(matches!(
            result,
            Err(ComposerError::StoreWriteFailure(StoreError::DuplicateVersion(id)))
                if id == concept.public_id()
        ));
        assert_eq!(second.state(), SessionState::Closed);
        assert_eq!(store.version_count().expect("count"), 1);
    }

    #[test]
    fn discard_reports_dropped_entities() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let mut session = Session::open(stamp(), &store);
        session
            .make_compose()
            .expect("compose")
            .concept(ids.issue_identity())
            .expect("concept")
            .with(Constituent::comment(ids.issue_identity(), "note").expect("comment"))
            .expect("attach");

        assert_eq!(session.discard().expect("discard"), 2);
        assert_eq!(store.version_count().expect("count"), 0);
    }

    /// Comment chain with `depth` levels, leaf first.
    fn comment_chain(ids: &RandomIdentities, depth: usize) -> Constituent {
        let mut chain = Constituent::comment(ids.issue_identity(), "leaf").expect("comment");
        for _ in 1..depth {
            chain = Constituent::comment(ids.issue_identity(), "link")
                .expect("comment")
                .with(chain)
                .expect("nest");
        }
        chain
    }

    #[test]
    fn deepest_allowed_chain_commits_in_pre_order() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let stamp = stamp();
        let chain = comment_chain(&ids, MAX_NESTING_DEPTH);
        assert_eq!(chain.depth(), MAX_NESTING_DEPTH);

        let mut expected = vec![chain.public_id()];
        let mut cursor = &chain;
        while let Some(next) = cursor.children().first() {
            expected.push(next.public_id());
            cursor = next;
        }

        let concept = ids.issue_identity();
        let (_, summary) = Session::scope(stamp.clone(), &store, |composer| {
            composer.concept(concept.clone())?.with(chain)?;
            Ok(())
        })
        .expect("scope");
        assert_eq!(summary.records, MAX_NESTING_DEPTH + 1);

        let mut parent = concept.public_id();
        for id in expected {
            let record = store.version_at(id, &stamp).expect("read").expect("present");
            assert_eq!(record.referenced_component(), Some(parent));
            parent = id;
        }
    }

    #[test]
    fn chain_past_depth_limit_rejected() {
        let ids = RandomIdentities::new();
        let chain = comment_chain(&ids, MAX_NESTING_DEPTH);

        let result = Constituent::comment(ids.issue_identity(), "one too many")
            .expect("comment")
            .with(chain)
            .map(|_| ());

        assert!(matches!(
            result,
            Err(ComposerError::TooDeep { depth, max })
                if depth == MAX_NESTING_DEPTH + 1 && max == MAX_NESTING_DEPTH
        ));
    }

    #[test]
    fn full_session_keeps_attached_work_and_commits_it() {
        let ids = RandomIdentities::new();
        let store = EphemeralStore::new();
        let mut session = Session::open(stamp(), &store);
        let composer = session.make_compose().expect("compose");

        let fill: Vec<Constituent> = (1..MAX_BATCH_LEN)
            .map(|_| Constituent::comment(ids.issue_identity(), "n").expect("comment"))
            .collect();
        let mut builder = composer.concept(ids.issue_identity()).expect("concept");
        builder.with(fill).expect("fill");
        let overflow = builder
            .with(Constituent::comment(ids.issue_identity(), "extra").expect("comment"))
            .map(|_| ());
        assert!(matches!(overflow, Err(ComposerError::BatchFull { .. })));

        let summary = session.close().expect("close");
        assert_eq!(summary.records, MAX_BATCH_LEN);
        assert_eq!(store.version_count().expect("count"), MAX_BATCH_LEN);
    }
}
