//! Graphics backend boundary
//!
//! Defines the trait a rendering backend must implement for the draw executor
//! to run against it. Every call is fire-and-forget: the executor never
//! consumes a device status, so the trait returns nothing. Handles are opaque
//! newtypes minted by whichever backend implements the trait.

use crate::foundation::math::Vec4;

/// Opaque handle to a backend vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferHandle(pub u64);

/// Opaque handle to a backend index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferHandle(pub u64);

/// Opaque handle to a backend vertex declaration (layout + attribute bindings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexDeclarationHandle(pub u64);

/// Opaque handle to a backend texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque handle to a backend shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Opaque handle to a backend render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub u64);

/// Backend location of a resolved shader constant
pub type ConstantLocation = i32;

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    /// Individual points
    Points,
    /// Individual line segments
    Lines,
    /// Connected line strip
    LineStrip,
    /// Individual triangles
    Triangles,
    /// Connected triangle strip
    TriangleStrip,
    /// Triangle fan around the first vertex
    TriangleFan,
}

/// Blend factor for source or destination color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // variants are the standard fixed-function factors
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

/// Comparison function for stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // variants are the standard comparison functions
pub enum CompareFunc {
    Never,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Always,
}

/// Stencil buffer update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // variants are the standard stencil operations
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Element width of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

/// Rendering device abstraction consumed by the draw executor
///
/// Implementations translate these calls into actual graphics API commands.
/// The executor issues them in a fixed per-object sequence: program, constants,
/// samplers, blend/stencil overrides, textures, vertex declaration, draw,
/// then unbinds.
pub trait GraphicsBackend {
    /// Make `program` the active shader program
    fn enable_program(&mut self, program: ProgramHandle);

    /// Set the constant at `location` to a vector4 value
    fn set_constant(&mut self, location: ConstantLocation, value: &Vec4);

    /// Set the blend function for subsequent draws
    fn set_blend_func(&mut self, source: BlendFactor, destination: BlendFactor);

    /// Enable or disable writes per color channel
    fn set_color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool);

    /// Set the stencil write mask
    fn set_stencil_mask(&mut self, mask: u32);

    /// Set the stencil comparison function, reference value, and read mask
    fn set_stencil_func(&mut self, func: CompareFunc, reference: u32, mask: u32);

    /// Set the stencil operations for fail / depth-fail / depth-pass
    fn set_stencil_op(&mut self, stencil_fail: StencilOp, depth_fail: StencilOp, depth_pass: StencilOp);

    /// Bind `texture` to texture unit `unit`
    fn enable_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Unbind the texture at unit `unit`
    fn disable_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Bind a vertex declaration together with its buffer, for `program`
    fn enable_vertex_declaration(
        &mut self,
        declaration: VertexDeclarationHandle,
        vertex_buffer: VertexBufferHandle,
        program: ProgramHandle,
    );

    /// Unbind a vertex declaration
    fn disable_vertex_declaration(&mut self, declaration: VertexDeclarationHandle);

    /// Issue an indexed draw call
    fn draw_elements(
        &mut self,
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        index_buffer: IndexBufferHandle,
    );

    /// Issue a non-indexed draw call over `[first, first + count)`
    fn draw(&mut self, primitive: PrimitiveType, first: u32, count: u32);
}
