//! # Render pipeline core
//!
//! This module owns the per-frame render command pipeline:
//!
//! - **[`RenderContext`]**: process-wide owner of every per-frame buffer,
//!   passed explicitly to each operation — no ambient global state
//! - **Render list** ([`list`]): frame-scoped entry collection between
//!   [`RenderContext::render_list_begin`] and
//!   [`RenderContext::render_list_end`]
//! - **Sorting** ([`sort`]): packed sort-key derivation from projected depth
//!   or explicit order
//! - **Dispatch & draw** ([`draw`]): reuse-checked batching and backend call
//!   emission
//!
//! All operations execute synchronously on one thread; the context's buffers
//! are exclusively owned and mutated in the calling thread's control flow.

pub mod backend;
pub mod constants;
pub mod draw;
pub mod list;
pub mod material;
pub mod object;
pub mod sort;

#[cfg(test)]
mod pipeline_tests;

pub use backend::{
    BlendFactor, CompareFunc, ConstantLocation, GraphicsBackend, IndexBufferHandle, IndexType,
    PrimitiveType, ProgramHandle, RenderTargetHandle, StencilOp, TextureHandle,
    VertexBufferHandle, VertexDeclarationHandle,
};
pub use constants::NamedConstantBuffer;
pub use draw::FrameFlush;
pub use list::{
    RenderListBatch, RenderListDispatch, RenderListDispatchHandle, RenderListEntry, RenderOrder,
    BATCH_KEY_MASK,
};
pub use material::{MaterialHandle, MaterialSystem, Predicate, MAX_PREDICATE_TAG_COUNT};
pub use object::{
    ColorMask, ObjectConstant, RenderObject, StencilTestParams, MAX_CONSTANT_COUNT,
    MAX_TEXTURE_COUNT,
};
pub use sort::RenderListSortValue;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::foundation::math::Mat4;

use list::RenderList;

/// Errors surfaced by pipeline operations
///
/// Capacity failures are recoverable: callers either grow the configured
/// capacities or tolerate dropped work. Nothing here is fatal to the process.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// A fixed-capacity table rejected an insert
    #[error("buffer is full")]
    BufferFull,

    /// The per-frame render object list is at capacity; logged once per
    /// overflow window, returned silently thereafter
    #[error("out of render resources")]
    OutOfResources,
}

/// Result type for pipeline operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Upper bound on dispatch routes, fixed by the 8-bit route index carried in
/// entries and sort keys
const MAX_DISPATCH_ROUTES: usize = 256;

/// Fixed capacities chosen at context creation
///
/// The dispatch table and render target registry never reallocate after
/// creation so that handles stay valid for the context's whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderContextParams {
    /// Capacity of the per-frame render object list
    pub max_instances: usize,
    /// Capacity of the render target registry
    pub max_render_targets: usize,
    /// Capacity of the dispatch route table; clamped to 256
    pub max_dispatch_routes: usize,
}

impl Default for RenderContextParams {
    fn default() -> Self {
        Self {
            max_instances: 1024,
            max_render_targets: 32,
            max_dispatch_routes: MAX_DISPATCH_ROUTES,
        }
    }
}

impl Config for RenderContextParams {}

/// A registered (name hash, render target) pair
#[derive(Debug, Clone, Copy)]
struct RenderTargetSetup {
    hash: u64,
    target: RenderTargetHandle,
}

/// Fixed-capacity list of the frame's render objects
///
/// Pushing past capacity logs a warning once, latches an out-of-resources
/// flag, and keeps returning [`RenderError::OutOfResources`] without further
/// logging until the list is reset for a new frame.
pub struct RenderObjectList {
    objects: Vec<RenderObject>,
    out_of_resources: bool,
}

impl RenderObjectList {
    fn new(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            out_of_resources: false,
        }
    }

    /// Append a render object for this frame.
    ///
    /// # Errors
    /// Returns [`RenderError::OutOfResources`] when the list is at capacity.
    pub fn push(&mut self, object: RenderObject) -> RenderResult<()> {
        if self.objects.len() == self.objects.capacity() {
            if !self.out_of_resources {
                log::warn!("renderer is out of resources, some objects will not be rendered");
                self.out_of_resources = true;
            }
            return Err(RenderError::OutOfResources);
        }
        self.objects.push(object);
        Ok(())
    }

    /// Number of objects collected so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects have been collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether the overflow latch is currently raised
    #[must_use]
    pub const fn is_out_of_resources(&self) -> bool {
        self.out_of_resources
    }

    /// Truncate before a re-dispatch; the overflow latch is left alone
    fn clear(&mut self) {
        self.objects.clear();
    }

    /// Truncate for a new frame and re-arm the overflow warning
    fn reset(&mut self) {
        self.objects.clear();
        self.out_of_resources = false;
    }

    fn objects(&self) -> &[RenderObject] {
        &self.objects
    }
}

/// Owner of all per-frame pipeline state
///
/// Created once at startup with fixed capacities, reset per frame through the
/// render list bracket and [`RenderContext::clear_render_objects`], dropped at
/// shutdown.
pub struct RenderContext {
    graphics: Box<dyn GraphicsBackend>,
    materials: Box<dyn MaterialSystem>,

    view: Mat4,
    projection: Mat4,
    view_proj: Mat4,

    render_targets: Vec<RenderTargetSetup>,

    pub(crate) objects: RenderObjectList,
    pub(crate) list: RenderList,
    pub(crate) sort_values: Vec<RenderListSortValue>,
    pub(crate) sort_buffers: [Vec<u32>; 2],
    pub(crate) sort_target: usize,
    pub(crate) dispatched_view_proj: Mat4,

    pub(crate) dispatches: Vec<Box<dyn RenderListDispatch>>,
    max_dispatch_routes: usize,

    pub(crate) flushers: Vec<Box<dyn FrameFlush>>,

    material_override: Option<MaterialHandle>,
    texture_overrides: [Option<TextureHandle>; MAX_TEXTURE_COUNT],
}

impl RenderContext {
    /// Create a context with the given backend, material system, and
    /// capacities
    #[must_use]
    pub fn new(
        graphics: Box<dyn GraphicsBackend>,
        materials: Box<dyn MaterialSystem>,
        params: RenderContextParams,
    ) -> Self {
        let max_dispatch_routes = params.max_dispatch_routes.min(MAX_DISPATCH_ROUTES);
        Self {
            graphics,
            materials,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_proj: Mat4::identity(),
            render_targets: Vec::with_capacity(params.max_render_targets),
            objects: RenderObjectList::new(params.max_instances),
            list: RenderList::default(),
            sort_values: Vec::new(),
            sort_buffers: [Vec::new(), Vec::new()],
            sort_target: 0,
            dispatched_view_proj: Mat4::identity(),
            dispatches: Vec::with_capacity(max_dispatch_routes),
            max_dispatch_routes,
            flushers: Vec::new(),
            material_override: None,
            texture_overrides: [None; MAX_TEXTURE_COUNT],
        }
    }

    // ---- view state -------------------------------------------------------

    /// Current view matrix
    #[must_use]
    pub const fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Current projection matrix
    #[must_use]
    pub const fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Current view-projection product
    #[must_use]
    pub const fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_proj
    }

    /// Set the view matrix and recompute the view-projection product
    pub fn set_view_matrix(&mut self, view: Mat4) {
        self.view = view;
        self.view_proj = self.projection * view;
    }

    /// Set the projection matrix and recompute the view-projection product
    pub fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
        self.view_proj = projection * self.view;
    }

    // ---- collaborator access ---------------------------------------------

    /// The graphics backend, for producers that create their own resources
    pub fn graphics_mut(&mut self) -> &mut dyn GraphicsBackend {
        self.graphics.as_mut()
    }

    /// The material system
    #[must_use]
    pub fn materials(&self) -> &dyn MaterialSystem {
        self.materials.as_ref()
    }

    // ---- render targets ---------------------------------------------------

    /// Register a render target under a name hash.
    ///
    /// # Errors
    /// Returns [`RenderError::BufferFull`] when the fixed registry capacity is
    /// exhausted.
    pub fn register_render_target(
        &mut self,
        target: RenderTargetHandle,
        hash: u64,
    ) -> RenderResult<()> {
        if self.render_targets.len() == self.render_targets.capacity() {
            return Err(RenderError::BufferFull);
        }
        self.render_targets.push(RenderTargetSetup { hash, target });
        Ok(())
    }

    /// Look up a registered render target by name hash
    #[must_use]
    pub fn render_target(&self, hash: u64) -> Option<RenderTargetHandle> {
        self.render_targets
            .iter()
            .find(|setup| setup.hash == hash)
            .map(|setup| setup.target)
    }

    // ---- frame object list ------------------------------------------------

    /// Append a render object to the frame's draw list.
    ///
    /// # Errors
    /// Returns [`RenderError::OutOfResources`] when the list is at capacity;
    /// the first overflow per frame logs a warning, later ones are silent.
    pub fn add_to_render(&mut self, object: RenderObject) -> RenderResult<()> {
        self.objects.push(object)
    }

    /// Number of render objects collected this frame
    #[must_use]
    pub fn render_object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether the frame object list has overflowed since its last reset
    #[must_use]
    pub const fn is_out_of_resources(&self) -> bool {
        self.objects.is_out_of_resources()
    }

    /// Truncate the frame object list and re-arm the overflow warning
    pub fn clear_render_objects(&mut self) {
        self.objects.reset();
    }

    // ---- global overrides -------------------------------------------------

    /// Replace every object's material for subsequent draws; `None` restores
    /// per-object materials
    pub fn set_material_override(&mut self, material: Option<MaterialHandle>) {
        self.material_override = material;
    }

    /// Currently active material override
    #[must_use]
    pub const fn material_override(&self) -> Option<MaterialHandle> {
        self.material_override
    }

    /// Replace the texture bound at `unit` for subsequent draws; `None`
    /// restores per-object textures at that unit
    ///
    /// # Panics
    /// Panics when `unit` is not below [`MAX_TEXTURE_COUNT`].
    pub fn set_texture_override(&mut self, unit: usize, texture: Option<TextureHandle>) {
        self.texture_overrides[unit] = texture;
    }

    /// Texture override currently active at `unit`
    #[must_use]
    pub const fn texture_override(&self, unit: usize) -> Option<TextureHandle> {
        self.texture_overrides[unit]
    }

    // ---- render list bracket ----------------------------------------------

    /// Start collecting a new frame's entries: truncates the entry buffer,
    /// the submitted-index list, and the dispatch route table
    pub fn render_list_begin(&mut self) {
        self.list.begin();
        self.dispatches.clear();
    }

    /// Register a dispatch route for this frame and get back its stable
    /// handle.
    ///
    /// # Errors
    /// Returns [`RenderError::BufferFull`] once the fixed route capacity is
    /// reached; previously returned handles stay valid.
    pub fn register_dispatch(
        &mut self,
        dispatch: Box<dyn RenderListDispatch>,
    ) -> RenderResult<RenderListDispatchHandle> {
        if self.dispatches.len() == self.max_dispatch_routes {
            return Err(RenderError::BufferFull);
        }
        self.dispatches.push(dispatch);
        Ok(RenderListDispatchHandle::new((self.dispatches.len() - 1) as u8))
    }

    /// Allocate a contiguous range of entries; see
    /// [`RenderContext::render_list_entries_mut`] to fill it.
    ///
    /// A later allocation may relocate the backing storage: finish writing and
    /// submit a range before allocating again, or carry only indices across
    /// allocations.
    pub fn render_list_alloc(&mut self, count: usize) -> std::ops::Range<u32> {
        self.list.alloc(count)
    }

    /// Writable view of a range returned by
    /// [`RenderContext::render_list_alloc`]
    pub fn render_list_entries_mut(
        &mut self,
        range: std::ops::Range<u32>,
    ) -> &mut [RenderListEntry] {
        self.list.entries_mut(range)
    }

    /// Submit an allocated range for sorting and dispatch
    pub fn render_list_submit(&mut self, range: std::ops::Range<u32>) {
        self.list.submit(range);
    }

    /// Finish collection: prepare both sort-order buffers to the submitted
    /// index capacity and reset the active buffer selector
    pub fn render_list_end(&mut self) {
        let capacity = self.list.submitted_capacity();
        for buffer in &mut self.sort_buffers {
            buffer.clear();
            if buffer.capacity() < capacity {
                buffer.reserve_exact(capacity);
            }
        }
        self.sort_target = 0;
    }

    /// Register a producer whose pending draw data is flushed into the object
    /// list right before draw execution (debug lines, text)
    pub fn register_frame_flush(&mut self, flush: Box<dyn FrameFlush>) {
        self.flushers.push(flush);
    }
}
