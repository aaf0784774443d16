//! Named constant buffers
//!
//! A [`NamedConstantBuffer`] parameterizes draws by constant name instead of
//! material slot index. Buffers are owned by the caller, live independently of
//! any render object, and can be reused across frames.

use std::collections::HashMap;

use crate::foundation::hash::hash_name;
use crate::foundation::math::Vec4;

use super::backend::GraphicsBackend;
use super::material::{MaterialHandle, MaterialSystem};

/// Name-hash to vector4 table applied against a material at draw time
#[derive(Debug, Clone, Default)]
pub struct NamedConstantBuffer {
    constants: HashMap<u64, Vec4>,
}

impl NamedConstantBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            constants: HashMap::with_capacity(16),
        }
    }

    /// Set a constant by name
    pub fn set(&mut self, name: &str, value: Vec4) {
        self.set_hashed(hash_name(name), value);
    }

    /// Set a constant by precomputed name hash
    pub fn set_hashed(&mut self, name_hash: u64, value: Vec4) {
        self.constants.insert(name_hash, value);
    }

    /// Look up a constant by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Vec4> {
        self.get_hashed(hash_name(name))
    }

    /// Look up a constant by precomputed name hash
    #[must_use]
    pub fn get_hashed(&self, name_hash: u64) -> Option<Vec4> {
        self.constants.get(&name_hash).copied()
    }

    /// Remove a constant by name, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Vec4> {
        self.remove_hashed(hash_name(name))
    }

    /// Remove a constant by precomputed name hash, returning its value
    pub fn remove_hashed(&mut self, name_hash: u64) -> Option<Vec4> {
        self.constants.remove(&name_hash)
    }

    /// Number of constants in the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Whether the buffer holds no constants
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Apply every constant against `material`.
    ///
    /// Each name is resolved through the material system; resolved names issue
    /// a backend constant-set call, unresolved names are skipped silently.
    pub fn apply(
        &self,
        graphics: &mut dyn GraphicsBackend,
        materials: &dyn MaterialSystem,
        material: MaterialHandle,
    ) {
        for (&name_hash, value) in &self.constants {
            if let Some(location) = materials.constant_location(material, name_hash) {
                graphics.set_constant(location, value);
            }
        }
    }
}
