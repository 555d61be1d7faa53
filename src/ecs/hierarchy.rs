//! Fragment ownership links
//!
//! Fragment templates hang off the body (or template) that breaks into them.
//! On fracture they are detached and become bodies themselves, keeping any
//! templates of their own.

use hecs::Entity;
use smallvec::SmallVec;

/// Marks an entity as a fragment template owned by another entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOf(pub Entity);

impl FragmentOf {
    /// The owning body or template
    #[must_use]
    pub const fn owner(&self) -> Entity {
        self.0
    }
}

/// Templates an entity breaks into, in attachment order
#[derive(Debug, Clone, Default)]
pub struct Fragments(SmallVec<[Entity; 8]>);

impl Fragments {
    /// List holding one template
    #[must_use]
    pub fn single(fragment: Entity) -> Self {
        let mut list = SmallVec::new();
        list.push(fragment);
        Self(list)
    }

    /// Append a template; attaching the same entity twice is a no-op
    pub fn push(&mut self, fragment: Entity) {
        if !self.0.contains(&fragment) {
            self.0.push(fragment);
        }
    }

    /// Drop a template, preserving the order of the rest
    pub fn remove(&mut self, fragment: Entity) -> bool {
        let before = self.0.len();
        self.0.retain(|e| *e != fragment);
        self.0.len() != before
    }

    /// Templates in attachment order
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.0
    }

    /// Number of templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no templates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
