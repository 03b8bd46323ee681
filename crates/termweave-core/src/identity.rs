//! # Identity Provider
//!
//! Issuing and resolving entity identities is an external concern. The
//! composer only needs the two operations in [`IdentityProvider`]; the
//! [`RandomIdentities`] provider backs them with random UUIDs.

use crate::{EntityRef, PublicId};

/// Issues identities for new entities.
///
/// # Extension Point
///
/// Implementations may mint ids from a registry, derive them from external
/// codes, or look them up in a store. The composer never inspects what they
/// return.
pub trait IdentityProvider {
    /// Issue a fresh, never-before-seen identity.
    fn issue_identity(&self) -> EntityRef;

    /// Build a reference to an entity whose public id is already known.
    fn make_from_known(&self, name: &str, public_id: PublicId) -> EntityRef;

    /// Issue a fresh identity carrying a description.
    fn issue_named(&self, name: &str) -> EntityRef {
        self.make_from_known(name, self.issue_identity().public_id())
    }
}

/// Identity provider backed by random UUID v4 values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentities;

impl RandomIdentities {
    /// Create a new provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl IdentityProvider for RandomIdentities {
    fn issue_identity(&self) -> EntityRef {
        EntityRef::new(PublicId::new_random())
    }

    fn make_from_known(&self, name: &str, public_id: PublicId) -> EntityRef {
        EntityRef::known(name, public_id)
    }
}
