//! # Constituent Module
//!
//! Attachable semantic annotations and their nested trees.
//!
//! A `Constituent` is a tagged variant (name, synonym, definition, dialect
//! marker, comment) that owns an ordered list of child constituents. Trees
//! are built bottom-up with [`Constituent::with`] and anchored under a
//! concept through a `ConceptBuilder`.
//!
//! ## Tree Invariants
//!
//! - A child may only be nested under a parent whose kind accepts it
//!   (`NodeKind::accepts`)
//! - An identity appears at most once in a tree
//! - Children keep insertion order
//! - A tree is at most `MAX_NESTING_DEPTH` levels deep
//!
//! A failing `attach` leaves the receiver exactly as it was.

use crate::limits::{MAX_NESTING_DEPTH, MAX_TEXT_LENGTH};
use crate::terms;
use crate::{ComposerError, EntityRef, NodeKind, PublicId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// PAYLOADS
// =============================================================================

/// Payload shared by names, synonyms and definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub language: EntityRef,
    pub text: String,
    pub case_significance: EntityRef,
}

/// Acceptability of the parent description within one dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectAcceptability {
    pub dialect: EntityRef,
    pub acceptability: EntityRef,
}

/// Free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

/// Kind-specific payload of a constituent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstituentData {
    FullyQualifiedName(Description),
    Synonym(Description),
    Definition(Description),
    Dialect(DialectAcceptability),
    Comment(Comment),
}

impl ConstituentData {
    /// Structural kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::FullyQualifiedName(_) => NodeKind::FullyQualifiedName,
            Self::Synonym(_) => NodeKind::Synonym,
            Self::Definition(_) => NodeKind::Definition,
            Self::Dialect(_) => NodeKind::Dialect,
            Self::Comment(_) => NodeKind::Comment,
        }
    }

    /// Text carried by the payload, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::FullyQualifiedName(d) | Self::Synonym(d) | Self::Definition(d) => Some(&d.text),
            Self::Comment(c) => Some(&c.text),
            Self::Dialect(_) => None,
        }
    }
}

/// Reject empty or oversized text.
fn validate_text(text: &str) -> Result<(), ComposerError> {
    if text.trim().is_empty() {
        return Err(ComposerError::InvalidText(
            "text must not be empty".to_string(),
        ));
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(ComposerError::InvalidText(format!(
            "text of {} bytes exceeds maximum of {} bytes",
            text.len(),
            MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// CONSTITUENT
// =============================================================================

/// One attachable entity and its ordered subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    identity: EntityRef,
    data: ConstituentData,
    children: Vec<Constituent>,
    /// Every identity in this subtree, including `self`.
    ids: BTreeSet<PublicId>,
    /// Levels in this subtree; a leaf is 1.
    depth: usize,
}

impl Constituent {
    /// Build a constituent from an identity and payload.
    ///
    /// Returns `ComposerError::InvalidText` if the payload text is empty or
    /// longer than `MAX_TEXT_LENGTH`.
    pub fn new(identity: EntityRef, data: ConstituentData) -> Result<Self, ComposerError> {
        if let Some(text) = data.text() {
            validate_text(text)?;
        }
        let ids = BTreeSet::from([identity.public_id()]);
        Ok(Self {
            identity,
            data,
            children: Vec::new(),
            ids,
            depth: 1,
        })
    }

    /// Fully qualified name: the unambiguous name of the concept.
    pub fn fully_qualified_name(
        identity: EntityRef,
        language: EntityRef,
        text: impl Into<String>,
        case_significance: EntityRef,
    ) -> Result<Self, ComposerError> {
        Self::new(
            identity,
            ConstituentData::FullyQualifiedName(Description {
                language,
                text: text.into(),
                case_significance,
            }),
        )
    }

    /// Synonym: an alternative name of the concept.
    pub fn synonym(
        identity: EntityRef,
        language: EntityRef,
        text: impl Into<String>,
        case_significance: EntityRef,
    ) -> Result<Self, ComposerError> {
        Self::new(
            identity,
            ConstituentData::Synonym(Description {
                language,
                text: text.into(),
                case_significance,
            }),
        )
    }

    /// Definition: a textual definition of the concept.
    pub fn definition(
        identity: EntityRef,
        language: EntityRef,
        text: impl Into<String>,
        case_significance: EntityRef,
    ) -> Result<Self, ComposerError> {
        Self::new(
            identity,
            ConstituentData::Definition(Description {
                language,
                text: text.into(),
                case_significance,
            }),
        )
    }

    /// Dialect acceptability marker for an arbitrary dialect pattern.
    pub fn dialect(
        identity: EntityRef,
        dialect: EntityRef,
        acceptability: EntityRef,
    ) -> Result<Self, ComposerError> {
        Self::new(
            identity,
            ConstituentData::Dialect(DialectAcceptability {
                dialect,
                acceptability,
            }),
        )
    }

    /// US English acceptability marker.
    pub fn us_english_dialect(
        identity: EntityRef,
        acceptability: EntityRef,
    ) -> Result<Self, ComposerError> {
        Self::dialect(identity, terms::us_english_dialect(), acceptability)
    }

    /// GB English acceptability marker.
    pub fn gb_english_dialect(
        identity: EntityRef,
        acceptability: EntityRef,
    ) -> Result<Self, ComposerError> {
        Self::dialect(identity, terms::gb_english_dialect(), acceptability)
    }

    /// Comment attachable to a concept or any constituent.
    pub fn comment(identity: EntityRef, text: impl Into<String>) -> Result<Self, ComposerError> {
        Self::new(identity, ConstituentData::Comment(Comment { text: text.into() }))
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn identity(&self) -> &EntityRef {
        &self.identity
    }

    #[must_use]
    pub fn public_id(&self) -> PublicId {
        self.identity.public_id()
    }

    #[must_use]
    pub fn data(&self) -> &ConstituentData {
        &self.data
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    #[must_use]
    pub fn children(&self) -> &[Constituent] {
        &self.children
    }

    /// Number of entities in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        self.ids.len()
    }

    /// Levels in this subtree, counting `self` as 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Every identity in this subtree, including `self`.
    pub(crate) fn subtree_ids(&self) -> &BTreeSet<PublicId> {
        &self.ids
    }

    // =========================================================================
    // ATTACHMENT
    // =========================================================================

    /// Attach children and return `self` for further chaining.
    ///
    /// Consuming form of [`Constituent::attach`], for building nested trees
    /// inline. On error the receiver and its already-attached children are
    /// dropped with it; use `attach` when the receiver must survive a failed
    /// call.
    pub fn with(mut self, children: impl IntoConstituents) -> Result<Self, ComposerError> {
        self.attach(children)?;
        Ok(self)
    }

    /// Attach children in place.
    ///
    /// Every child is checked before any is appended, so on error the
    /// receiver is unchanged. Fails with `InvalidNesting`, with `TooDeep`
    /// past `MAX_NESTING_DEPTH`, and with `AlreadyAttached` if an identity
    /// would appear twice in the resulting tree.
    pub fn attach(
        &mut self,
        children: impl IntoConstituents,
    ) -> Result<&mut Self, ComposerError> {
        let children = children.into_constituents();
        check_nesting(self.kind(), &children)?;

        let depth = children
            .iter()
            .map(|child| child.depth.saturating_add(1))
            .fold(self.depth, usize::max);
        if depth > MAX_NESTING_DEPTH {
            return Err(ComposerError::TooDeep {
                depth,
                max: MAX_NESTING_DEPTH,
            });
        }

        // Only the incoming subtrees are walked; the receiver's ids are cached.
        let mut incoming = BTreeSet::new();
        for id in children.iter().flat_map(|child| child.ids.iter()) {
            if self.ids.contains(id) || !incoming.insert(*id) {
                return Err(ComposerError::AlreadyAttached(*id));
            }
        }

        self.ids.extend(incoming);
        self.depth = depth;
        self.children.extend(children);
        Ok(self)
    }
}

/// Check that every child kind may nest under `parent`.
pub(crate) fn check_nesting(
    parent: NodeKind,
    children: &[Constituent],
) -> Result<(), ComposerError> {
    match children.iter().find(|c| !parent.accepts(c.kind())) {
        Some(bad) => Err(ComposerError::InvalidNesting {
            parent,
            child: bad.kind(),
        }),
        None => Ok(()),
    }
}

// =============================================================================
// INTO CONSTITUENTS
// =============================================================================

/// Anything `with` accepts: one constituent or an ordered group of them.
pub trait IntoConstituents {
    fn into_constituents(self) -> Vec<Constituent>;
}

impl IntoConstituents for Constituent {
    fn into_constituents(self) -> Vec<Constituent> {
        vec![self]
    }
}

impl IntoConstituents for Vec<Constituent> {
    fn into_constituents(self) -> Vec<Constituent> {
        self
    }
}

impl<const N: usize> IntoConstituents for [Constituent; N] {
    fn into_constituents(self) -> Vec<Constituent> {
        self.into()
    }
}

// =============================================================================
// TESTS
// =============================================================================
