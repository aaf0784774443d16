//! Material system boundary
//!
//! The material and shader system is an external collaborator: this core only
//! needs to resolve constant names to backend locations, query tag masks, and
//! ask the system to apply its own material-level state.

use super::backend::{ConstantLocation, GraphicsBackend, ProgramHandle};
use super::object::RenderObject;
use super::{RenderError, RenderResult};

/// Opaque handle to a material owned by the material system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Material system abstraction consumed by the draw executor and the
/// per-object constant API
pub trait MaterialSystem {
    /// Resolve a constant name hash to its backend location for `material`,
    /// or `None` when the material does not define the name
    fn constant_location(&self, material: MaterialHandle, name_hash: u64)
        -> Option<ConstantLocation>;

    /// Tag bitmask of `material`, matched against draw predicates
    fn tag_mask(&self, material: MaterialHandle) -> u32;

    /// Convert a list of tag name hashes into a combined bitmask
    fn tags_to_mask(&self, tags: &[u64]) -> u32;

    /// Shader program bound to `material`
    fn program(&self, material: MaterialHandle) -> ProgramHandle;

    /// Apply material-level constants for `object` (world transform and
    /// friends) against the backend
    fn apply_constants(
        &self,
        graphics: &mut dyn GraphicsBackend,
        material: MaterialHandle,
        object: &RenderObject,
    );

    /// Apply the material's samplers against the backend
    fn apply_samplers(&self, graphics: &mut dyn GraphicsBackend, material: MaterialHandle);
}

/// Maximum number of tags a [`Predicate`] can carry
pub const MAX_PREDICATE_TAG_COUNT: usize = 32;

/// Draw filter over material tags
///
/// A draw restricted by a predicate only executes render objects whose
/// material tag mask is a superset of the predicate's mask. An empty predicate
/// matches everything.
#[derive(Debug, Clone)]
pub struct Predicate {
    tags: [u64; MAX_PREDICATE_TAG_COUNT],
    tag_count: usize,
}

impl Predicate {
    /// Create an empty predicate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tags: [0; MAX_PREDICATE_TAG_COUNT],
            tag_count: 0,
        }
    }

    /// Add a tag name hash to the predicate
    ///
    /// # Errors
    /// Returns [`RenderError::BufferFull`] when the fixed tag capacity is
    /// exhausted.
    pub fn push(&mut self, tag: u64) -> RenderResult<()> {
        if self.tag_count == MAX_PREDICATE_TAG_COUNT {
            return Err(RenderError::BufferFull);
        }
        self.tags[self.tag_count] = tag;
        self.tag_count += 1;
        Ok(())
    }

    /// Tags collected so far
    #[must_use]
    pub fn tags(&self) -> &[u64] {
        &self.tags[..self.tag_count]
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_predicate_has_no_tags() {
        let predicate = Predicate::new();
        assert!(predicate.tags().is_empty());
    }

    #[test]
    fn push_collects_tags_in_order() {
        let mut predicate = Predicate::new();
        predicate.push(7).unwrap();
        predicate.push(11).unwrap();
        assert_eq!(predicate.tags(), &[7, 11]);
    }

    #[test]
    fn push_past_capacity_fails_and_preserves_tags() {
        let mut predicate = Predicate::new();
        for tag in 0..MAX_PREDICATE_TAG_COUNT as u64 {
            predicate.push(tag).unwrap();
        }
        assert_eq!(predicate.push(99), Err(RenderError::BufferFull));
        assert_eq!(predicate.tags().len(), MAX_PREDICATE_TAG_COUNT);
        assert_eq!(predicate.tags()[MAX_PREDICATE_TAG_COUNT - 1], MAX_PREDICATE_TAG_COUNT as u64 - 1);
    }
}
