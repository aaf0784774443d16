//! Math utilities and types
//!
//! Provides the fundamental math types used by the render pipeline.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Compare two matrices bit for bit.
///
/// The draw reuse cache must only fire when the view-projection matrix is
/// exactly the one a dispatch was built for. Float equality is the wrong tool
/// here: `-0.0 == 0.0` and `NaN != NaN` would both misclassify, so elements
/// are compared through their bit patterns.
#[must_use]
pub fn mat4_bits_eq(a: &Mat4, b: &Mat4) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| x.to_bits() == y.to_bits())
}
