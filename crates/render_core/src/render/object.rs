//! Render object draw descriptors
//!
//! A [`RenderObject`] is the heavyweight counterpart of a render list entry:
//! everything the draw executor needs to issue one draw call. Producers build
//! them inside batch dispatch callbacks and push them onto the context's
//! frame object list.

use bitflags::bitflags;

use crate::foundation::math::{Mat4, Vec4};

use super::backend::{
    BlendFactor, CompareFunc, ConstantLocation, IndexBufferHandle, IndexType, PrimitiveType,
    StencilOp, TextureHandle, VertexBufferHandle, VertexDeclarationHandle,
};
use super::material::{MaterialHandle, MaterialSystem};

/// Number of texture slots per render object
pub const MAX_TEXTURE_COUNT: usize = 8;

/// Number of named constant slots per render object
pub const MAX_CONSTANT_COUNT: usize = 4;

bitflags! {
    /// Per-channel color write mask carried by stencil test parameters
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColorMask: u8 {
        /// Write the red channel
        const RED = 1 << 3;
        /// Write the green channel
        const GREEN = 1 << 2;
        /// Write the blue channel
        const BLUE = 1 << 1;
        /// Write the alpha channel
        const ALPHA = 1 << 0;
    }
}

/// Stencil test state applied when a render object overrides the default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilTestParams {
    /// Stencil comparison function
    pub func: CompareFunc,
    /// Operation on stencil test failure
    pub op_stencil_fail: StencilOp,
    /// Operation on depth test failure
    pub op_depth_fail: StencilOp,
    /// Operation on depth test pass
    pub op_depth_pass: StencilOp,
    /// Stencil reference value
    pub reference: u32,
    /// Stencil read mask
    pub reference_mask: u32,
    /// Stencil write mask
    pub buffer_mask: u32,
    /// Color channels written while the test is active
    pub color_mask: ColorMask,
}

impl Default for StencilTestParams {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            op_stencil_fail: StencilOp::Keep,
            op_depth_fail: StencilOp::Keep,
            op_depth_pass: StencilOp::Keep,
            reference: 0,
            reference_mask: 0xff,
            buffer_mask: 0xff,
            color_mask: ColorMask::all(),
        }
    }
}

/// One occupied per-object constant slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectConstant {
    /// Hash of the constant name
    pub name_hash: u64,
    /// Resolved backend location
    pub location: ConstantLocation,
    /// Value applied before the draw call
    pub value: Vec4,
}

/// Draw descriptor consumed by the draw executor
///
/// Plain data: producers fill the public fields directly, the way they would
/// a parameter struct. Constant slots are managed through
/// [`RenderObject::enable_constant`] / [`RenderObject::disable_constant`]
/// because their occupancy rules are part of the pipeline contract.
#[derive(Debug, Clone)]
pub struct RenderObject {
    /// World transform, consumed by the material system's constant application
    pub world_transform: Mat4,
    /// Texture coordinate transform
    pub texture_transform: Mat4,
    /// Vertex buffer to draw from
    pub vertex_buffer: VertexBufferHandle,
    /// Vertex layout for the buffer
    pub vertex_declaration: VertexDeclarationHandle,
    /// Index buffer; `None` selects a non-indexed draw
    pub index_buffer: Option<IndexBufferHandle>,
    /// Element width of `index_buffer`
    pub index_type: IndexType,
    /// Primitive topology
    pub primitive_type: PrimitiveType,
    /// First vertex for non-indexed draws
    pub vertex_start: u32,
    /// Number of vertices (indexed draws: number of indices); zero skips the
    /// object entirely
    pub vertex_count: u32,
    /// Texture bound per unit; `None` leaves the unit untouched
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_COUNT],
    /// Material that shades this object
    pub material: MaterialHandle,
    /// Source blend factor, applied only when `set_blend_factors` is set
    pub source_blend_factor: BlendFactor,
    /// Destination blend factor, applied only when `set_blend_factors` is set
    pub destination_blend_factor: BlendFactor,
    /// Apply the blend factor override for this object
    pub set_blend_factors: bool,
    /// Stencil state, applied only when `set_stencil_test` is set
    pub stencil_test_params: StencilTestParams,
    /// Apply the stencil override for this object
    pub set_stencil_test: bool,
    constants: [Option<ObjectConstant>; MAX_CONSTANT_COUNT],
}

impl RenderObject {
    /// Create a descriptor with identity transforms, no buffers bound, and
    /// every constant slot free
    #[must_use]
    pub fn new(material: MaterialHandle) -> Self {
        Self {
            world_transform: Mat4::identity(),
            texture_transform: Mat4::identity(),
            vertex_buffer: VertexBufferHandle(0),
            vertex_declaration: VertexDeclarationHandle(0),
            index_buffer: None,
            index_type: IndexType::U32,
            primitive_type: PrimitiveType::Triangles,
            vertex_start: 0,
            vertex_count: 0,
            textures: [None; MAX_TEXTURE_COUNT],
            material,
            source_blend_factor: BlendFactor::One,
            destination_blend_factor: BlendFactor::Zero,
            set_blend_factors: false,
            stencil_test_params: StencilTestParams::default(),
            set_stencil_test: false,
            constants: [None; MAX_CONSTANT_COUNT],
        }
    }

    /// Set a named constant for this object.
    ///
    /// Reuses the slot already bound to `name_hash` if there is one, otherwise
    /// claims the first free slot. Names the material cannot resolve are
    /// silently ignored. When every slot is taken by other names, the call
    /// logs an error and changes nothing.
    pub fn enable_constant(
        &mut self,
        materials: &dyn MaterialSystem,
        name_hash: u64,
        value: Vec4,
    ) {
        let Some(location) = materials.constant_location(self.material, name_hash) else {
            // Not defined in the material
            return;
        };

        if let Some(slot) = self
            .constants
            .iter_mut()
            .flatten()
            .find(|c| c.name_hash == name_hash)
        {
            slot.location = location;
            slot.value = value;
            return;
        }

        if let Some(slot) = self.constants.iter_mut().find(|c| c.is_none()) {
            *slot = Some(ObjectConstant {
                name_hash,
                location,
                value,
            });
            return;
        }

        log::error!(
            "out of per-object constant slots, max {MAX_CONSTANT_COUNT}, when setting constant {name_hash:#018x}"
        );
    }

    /// Free the slot bound to `name_hash`; a name that is not present is a
    /// no-op
    pub fn disable_constant(&mut self, name_hash: u64) {
        for slot in &mut self.constants {
            if slot.as_ref().is_some_and(|c| c.name_hash == name_hash) {
                *slot = None;
                return;
            }
        }
    }

    /// Constant slots in declaration order; free slots are `None`
    #[must_use]
    pub const fn constants(&self) -> &[Option<ObjectConstant>; MAX_CONSTANT_COUNT] {
        &self.constants
    }
}
