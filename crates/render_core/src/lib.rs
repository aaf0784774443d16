//! # render_core
//!
//! Frame-scoped render command pipeline: collects lightweight draw candidates
//! from unrelated producers, assigns them a total order suitable for GPU
//! submission, merges adjacent same-material work into batches, and dispatches
//! each batch back to its producer so it can emit concrete draw descriptors.
//!
//! ## Architecture
//!
//! - **Render list**: a growable, frame-scoped entry buffer that producers fill
//!   between [`RenderContext::render_list_begin`] and
//!   [`RenderContext::render_list_end`]
//! - **Sort value derivation**: packs projected depth or explicit order into a
//!   single comparable key per entry
//! - **Sort & reuse cache**: double-buffered index permutations that let an
//!   unchanged camera or an unchanged ordering skip re-batching entirely
//! - **Batch dispatch**: groups sorted runs by (route, batch key) and calls the
//!   registered [`render::RenderListDispatch`] for each run
//! - **Draw execution**: walks the accumulated [`render::RenderObject`] list
//!   and issues state setup plus draw calls against the graphics backend
//!
//! ## Design Goals
//!
//! - **Backend agnostic**: the graphics device and the material system are
//!   trait boundaries; this crate never talks to a GPU directly
//! - **Single threaded by construction**: all per-frame buffers are owned by
//!   one [`render::RenderContext`] passed explicitly to every operation
//! - **Frame coherent**: re-issuing an identical frame costs one matrix
//!   comparison, not a resort
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_core::prelude::*;
//! # fn backend() -> Box<dyn GraphicsBackend> { unimplemented!() }
//! # fn materials() -> Box<dyn MaterialSystem> { unimplemented!() }
//!
//! let mut context = RenderContext::new(backend(), materials(), RenderContextParams::default());
//!
//! context.render_list_begin();
//! // producers register routes, allocate entry ranges, fill and submit them
//! context.render_list_end();
//!
//! context.draw_render_list(None, None).expect("draw failed");
//! ```

pub mod config;
pub mod foundation;
pub mod render;

/// Commonly used types, importable as a group.
pub mod prelude {
    pub use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};
    pub use crate::render::{
        GraphicsBackend, MaterialSystem, NamedConstantBuffer, Predicate, RenderContext,
        RenderContextParams, RenderError, RenderListBatch, RenderListDispatch, RenderListEntry,
        RenderObject, RenderOrder, RenderResult,
    };
}
