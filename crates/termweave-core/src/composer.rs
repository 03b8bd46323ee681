//! # Composer Module
//!
//! Factory and aggregator for everything a session composes.
//!
//! The `Composer`:
//! - Registers concepts and hands out a `ConceptBuilder` for each
//! - Anchors constituent trees under those concepts
//! - Tracks every identity used in the session so collisions are caught
//!   before commit
//! - Does NOT write anything; the owning `Session` drains it on close
//!
//! Only entities reachable from a registered concept are ever committed.

use crate::constituent::{Constituent, IntoConstituents, check_nesting};
use crate::limits::MAX_BATCH_LEN;
use crate::{ComposerError, EntityRef, NodeKind, PublicId, Stamp};
use std::collections::BTreeSet;

// =============================================================================
// CONCEPT
// =============================================================================

/// Root of an attachment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    identity: EntityRef,
    children: Vec<Constituent>,
}

impl Concept {
    fn new(identity: EntityRef) -> Self {
        Self {
            identity,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &EntityRef {
        &self.identity
    }

    #[must_use]
    pub fn public_id(&self) -> PublicId {
        self.identity.public_id()
    }

    #[must_use]
    pub fn children(&self) -> &[Constituent] {
        &self.children
    }

    /// Number of entities in this tree, including the concept itself.
    #[must_use]
    pub fn tree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Constituent::subtree_len)
            .sum::<usize>()
    }
}

// =============================================================================
// COMPOSER
// =============================================================================

/// Creates concept builders and accumulates the session's pending trees.
#[derive(Debug)]
pub struct Composer {
    stamp: Stamp,
    /// Concept trees in registration order.
    concepts: Vec<Concept>,
    /// Every identity registered or attached in this session.
    identities: BTreeSet<PublicId>,
    usage_errors: usize,
    closed: bool,
}

impl Composer {
    pub(crate) fn new(stamp: Stamp) -> Self {
        Self {
            stamp,
            concepts: Vec::new(),
            identities: BTreeSet::new(),
            usage_errors: 0,
            closed: false,
        }
    }

    /// Register a new concept and return a builder scoped to it.
    ///
    /// Fails with `IdentityCollision` if the identity was already used in
    /// this session, and with `SessionClosed` after the session closed.
    pub fn concept(&mut self, identity: EntityRef) -> Result<ConceptBuilder<'_>, ComposerError> {
        self.ensure_open()?;

        let public_id = identity.public_id();
        if self.identities.contains(&public_id) {
            self.usage_errors = self.usage_errors.saturating_add(1);
            return Err(ComposerError::IdentityCollision(public_id));
        }
        if let Err(e) = self.ensure_capacity(1) {
            self.usage_errors = self.usage_errors.saturating_add(1);
            return Err(e);
        }

        tracing::debug!(%public_id, concept = %identity, "registering concept");
        self.identities.insert(public_id);
        self.concepts.push(Concept::new(identity));
        let index = self.concepts.len() - 1;

        Ok(ConceptBuilder {
            composer: self,
            index,
        })
    }

    /// The STAMP coordinate every composed entity will carry.
    #[must_use]
    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    /// Registered concepts in registration order.
    #[must_use]
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    #[must_use]
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// Number of entities that a commit would write.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        // Every pending entity registered its identity exactly once.
        self.identities.len()
    }

    /// True if any composition call in this session has failed.
    #[must_use]
    pub fn had_usage_error(&self) -> bool {
        self.usage_errors > 0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), ComposerError> {
        if self.closed {
            return Err(ComposerError::SessionClosed);
        }
        Ok(())
    }

    /// Check that `incoming` more entities still fit in one commit batch.
    fn ensure_capacity(&self, incoming: usize) -> Result<(), ComposerError> {
        let len = self.pending_len().saturating_add(incoming);
        if len > MAX_BATCH_LEN {
            return Err(ComposerError::BatchFull {
                len,
                max: MAX_BATCH_LEN,
            });
        }
        Ok(())
    }

    /// Anchor constituent trees directly under the concept at `index`.
    fn anchor(&mut self, index: usize, children: Vec<Constituent>) -> Result<(), ComposerError> {
        self.ensure_open()?;

        let fresh = match self.admit(&children) {
            Ok(fresh) => fresh,
            Err(e) => {
                self.usage_errors = self.usage_errors.saturating_add(1);
                return Err(e);
            }
        };

        tracing::debug!(
            concept = %self.concepts[index].identity,
            entities = fresh.len(),
            "attaching constituents"
        );
        self.identities.extend(fresh);
        self.concepts[index].children.extend(children);
        Ok(())
    }

    /// Validate trees against the nesting table, the session's identities
    /// and the batch limit.
    ///
    /// Returns the identities the trees would add.
    fn admit(&self, children: &[Constituent]) -> Result<BTreeSet<PublicId>, ComposerError> {
        check_nesting(NodeKind::Concept, children)?;

        let mut fresh = BTreeSet::new();
        for id in children.iter().flat_map(|child| child.subtree_ids().iter()) {
            if self.identities.contains(id) || !fresh.insert(*id) {
                return Err(ComposerError::AlreadyAttached(*id));
            }
        }
        self.ensure_capacity(fresh.len())?;
        Ok(fresh)
    }

    /// Take every pending concept tree and close the composer.
    pub(crate) fn drain(&mut self) -> Vec<Concept> {
        self.closed = true;
        self.identities.clear();
        std::mem::take(&mut self.concepts)
    }
}

// =============================================================================
// CONCEPT BUILDER
// =============================================================================

/// Fluent handle to one registered concept.
///
/// Each `with` call appends to the concept's children and returns the same
/// builder, so independent constituents can be chained at the root level.
#[derive(Debug)]
pub struct ConceptBuilder<'a> {
    composer: &'a mut Composer,
    index: usize,
}

impl ConceptBuilder<'_> {
    /// Attach one or more constituent trees to this concept.
    ///
    /// Fails with `InvalidNesting` for kinds a concept does not accept and
    /// with `AlreadyAttached` if any identity in the trees is already used
    /// in the session. On error nothing is attached.
    pub fn with(&mut self, children: impl IntoConstituents) -> Result<&mut Self, ComposerError> {
        self.composer
            .anchor(self.index, children.into_constituents())?;
        Ok(self)
    }

    #[must_use]
    pub fn identity(&self) -> &EntityRef {
        &self.concept().identity
    }

    #[must_use]
    pub fn children(&self) -> &[Constituent] {
        &self.concept().children
    }

    fn concept(&self) -> &Concept {
        &self.composer.concepts[self.index]
    }
}

// =============================================================================
// TESTS
// =============================================================================
