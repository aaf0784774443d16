//! End-to-end pipeline scenarios against mock collaborators
//!
//! These tests run the full collect → sort → dispatch → draw cycle with a
//! recording backend and a stub material system, validating the pipeline
//! contract: batch grouping, reuse caching, ordering, and capacity latches.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

use super::backend::{
    BlendFactor, CompareFunc, ConstantLocation, GraphicsBackend, IndexBufferHandle, IndexType,
    PrimitiveType, ProgramHandle, StencilOp, TextureHandle, VertexBufferHandle,
    VertexDeclarationHandle,
};
use super::material::{MaterialHandle, MaterialSystem, Predicate};
use super::object::{ColorMask, RenderObject};
use super::{
    RenderContext, RenderContextParams, RenderError, RenderListBatch, RenderListDispatch,
    RenderObjectList, RenderOrder,
};

// ---- mock collaborators ---------------------------------------------------

/// Backend that ignores every call. Used where only pipeline bookkeeping is
/// under test.
#[derive(Default)]
pub(crate) struct NullBackend;

impl GraphicsBackend for NullBackend {
    fn enable_program(&mut self, _: ProgramHandle) {}
    fn set_constant(&mut self, _: ConstantLocation, _: &Vec4) {}
    fn set_blend_func(&mut self, _: BlendFactor, _: BlendFactor) {}
    fn set_color_mask(&mut self, _: bool, _: bool, _: bool, _: bool) {}
    fn set_stencil_mask(&mut self, _: u32) {}
    fn set_stencil_func(&mut self, _: CompareFunc, _: u32, _: u32) {}
    fn set_stencil_op(&mut self, _: StencilOp, _: StencilOp, _: StencilOp) {}
    fn enable_texture(&mut self, _: u32, _: TextureHandle) {}
    fn disable_texture(&mut self, _: u32, _: TextureHandle) {}
    fn enable_vertex_declaration(
        &mut self,
        _: VertexDeclarationHandle,
        _: VertexBufferHandle,
        _: ProgramHandle,
    ) {
    }
    fn disable_vertex_declaration(&mut self, _: VertexDeclarationHandle) {}
    fn draw_elements(&mut self, _: PrimitiveType, _: u32, _: IndexType, _: IndexBufferHandle) {}
    fn draw(&mut self, _: PrimitiveType, _: u32, _: u32) {}
}

/// Backend call trace, shared between the test and the boxed backend.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    EnableProgram(u64),
    SetConstant(ConstantLocation),
    SetBlendFunc(BlendFactor, BlendFactor),
    SetColorMask(bool, bool, bool, bool),
    SetStencilMask(u32),
    SetStencilFunc(CompareFunc, u32, u32),
    SetStencilOp(StencilOp, StencilOp, StencilOp),
    EnableTexture(u32, u64),
    DisableTexture(u32, u64),
    EnableVertexDeclaration(u64, u64),
    DisableVertexDeclaration(u64),
    DrawElements { count: u32 },
    Draw { first: u32, count: u32 },
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub calls: Rc<RefCell<Vec<BackendCall>>>,
}

impl RecordingBackend {
    fn log(&self, call: BackendCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn enable_program(&mut self, program: ProgramHandle) {
        self.log(BackendCall::EnableProgram(program.0));
    }
    fn set_constant(&mut self, location: ConstantLocation, _: &Vec4) {
        self.log(BackendCall::SetConstant(location));
    }
    fn set_blend_func(&mut self, source: BlendFactor, destination: BlendFactor) {
        self.log(BackendCall::SetBlendFunc(source, destination));
    }
    fn set_color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.log(BackendCall::SetColorMask(r, g, b, a));
    }
    fn set_stencil_mask(&mut self, mask: u32) {
        self.log(BackendCall::SetStencilMask(mask));
    }
    fn set_stencil_func(&mut self, func: CompareFunc, reference: u32, mask: u32) {
        self.log(BackendCall::SetStencilFunc(func, reference, mask));
    }
    fn set_stencil_op(&mut self, sfail: StencilOp, dpfail: StencilOp, dppass: StencilOp) {
        self.log(BackendCall::SetStencilOp(sfail, dpfail, dppass));
    }
    fn enable_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.log(BackendCall::EnableTexture(unit, texture.0));
    }
    fn disable_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.log(BackendCall::DisableTexture(unit, texture.0));
    }
    fn enable_vertex_declaration(
        &mut self,
        declaration: VertexDeclarationHandle,
        vertex_buffer: VertexBufferHandle,
        _: ProgramHandle,
    ) {
        self.log(BackendCall::EnableVertexDeclaration(declaration.0, vertex_buffer.0));
    }
    fn disable_vertex_declaration(&mut self, declaration: VertexDeclarationHandle) {
        self.log(BackendCall::DisableVertexDeclaration(declaration.0));
    }
    fn draw_elements(&mut self, _: PrimitiveType, count: u32, _: IndexType, _: IndexBufferHandle) {
        self.log(BackendCall::DrawElements { count });
    }
    fn draw(&mut self, _: PrimitiveType, first: u32, count: u32) {
        self.log(BackendCall::Draw { first, count });
    }
}

/// Material system stub: a material's tag mask is the low 32 bits of its
/// handle, tag lists OR together, and every constant name resolves to a
/// location derived from its hash.
#[derive(Default)]
pub(crate) struct StubMaterials;

impl MaterialSystem for StubMaterials {
    fn constant_location(&self, _: MaterialHandle, name_hash: u64) -> Option<ConstantLocation> {
        Some((name_hash & 0x3f) as ConstantLocation)
    }
    fn tag_mask(&self, material: MaterialHandle) -> u32 {
        material.0 as u32
    }
    fn tags_to_mask(&self, tags: &[u64]) -> u32 {
        tags.iter().fold(0, |mask, &tag| mask | tag as u32)
    }
    fn program(&self, material: MaterialHandle) -> ProgramHandle {
        ProgramHandle(0x1000 + material.0)
    }
    fn apply_constants(&self, _: &mut dyn GraphicsBackend, _: MaterialHandle, _: &RenderObject) {}
    fn apply_samplers(&self, _: &mut dyn GraphicsBackend, _: MaterialHandle) {}
}

/// Dispatch event trace, shared between the test and the boxed routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchEvent {
    Begin(u8),
    Batch { label: u8, indices: Vec<u32> },
    End(u8),
}

/// Route that records its protocol events and emits one triangle per entry.
struct RecordingDispatch {
    label: u8,
    events: Rc<RefCell<Vec<DispatchEvent>>>,
}

impl RenderListDispatch for RecordingDispatch {
    fn on_begin(&mut self, _: &mut RenderObjectList) {
        self.events.borrow_mut().push(DispatchEvent::Begin(self.label));
    }

    fn on_batch(&mut self, batch: RenderListBatch<'_>) {
        self.events.borrow_mut().push(DispatchEvent::Batch {
            label: self.label,
            indices: batch.range.to_vec(),
        });
        for &index in batch.range {
            let entry = &batch.entries[index as usize];
            let mut ro = RenderObject::new(MaterialHandle(u64::from(self.label)));
            ro.vertex_count = 3;
            ro.vertex_start = entry.user_data as u32;
            batch.objects.push(ro).unwrap();
        }
    }

    fn on_end(&mut self, _: &mut RenderObjectList) {
        self.events.borrow_mut().push(DispatchEvent::End(self.label));
    }
}

/// Route that does nothing; used for capacity tests.
struct NoopDispatch;

impl RenderListDispatch for NoopDispatch {
    fn on_batch(&mut self, _: RenderListBatch<'_>) {}
}

// ---- helpers --------------------------------------------------------------

struct Harness {
    context: RenderContext,
    calls: Rc<RefCell<Vec<BackendCall>>>,
}

fn harness(params: RenderContextParams) -> Harness {
    let backend = RecordingBackend::default();
    let calls = Rc::clone(&backend.calls);
    let context = RenderContext::new(Box::new(backend), Box::new(StubMaterials), params);
    Harness { context, calls }
}

fn recording_routes(
    context: &mut RenderContext,
    labels: &[u8],
) -> (Vec<super::RenderListDispatchHandle>, Rc<RefCell<Vec<DispatchEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let handles = labels
        .iter()
        .map(|&label| {
            context
                .register_dispatch(Box::new(RecordingDispatch {
                    label,
                    events: Rc::clone(&events),
                }))
                .unwrap()
        })
        .collect();
    (handles, events)
}

/// Fill one frame of overlay entries described as (route, batch key, order).
fn submit_overlay_entries(
    context: &mut RenderContext,
    entries: &[(super::RenderListDispatchHandle, u32, u32)],
) {
    let range = context.render_list_alloc(entries.len());
    for (slot, &(dispatch, batch_key, order)) in context
        .render_list_entries_mut(range.clone())
        .iter_mut()
        .zip(entries)
    {
        slot.major_order = RenderOrder::AfterWorld;
        slot.dispatch = dispatch;
        slot.batch_key = batch_key;
        slot.order = order;
    }
    context.render_list_submit(range);
}

fn submit_world_entries(
    context: &mut RenderContext,
    dispatch: super::RenderListDispatchHandle,
    depths: &[f32],
) {
    let range = context.render_list_alloc(depths.len());
    for (slot, &z) in context
        .render_list_entries_mut(range.clone())
        .iter_mut()
        .zip(depths)
    {
        slot.major_order = RenderOrder::World;
        slot.dispatch = dispatch;
        slot.world_position = Point3::new(0.0, 0.0, z);
    }
    context.render_list_submit(range);
}

// ---- scenarios ------------------------------------------------------------

#[test]
fn batches_are_maximal_sorted_runs_of_route_and_key() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();
    let (routes, events) = recording_routes(&mut h.context, &[0, 1]);
    let (a, b) = (routes[0], routes[1]);

    // Ascending explicit orders keep submission order through the sort; the
    // trailing (a, 1) entry is separated from the leading pair by (b, 2) and
    // must not be merged across it.
    submit_overlay_entries(&mut h.context, &[(a, 1, 0), (a, 1, 1), (b, 2, 2), (a, 1, 3)]);
    h.context.render_list_end();

    h.context.draw_render_list(None, None).unwrap();

    let events = events.borrow();
    assert_eq!(
        *events,
        vec![
            DispatchEvent::Begin(0),
            DispatchEvent::Begin(1),
            DispatchEvent::Batch { label: 0, indices: vec![0, 1] },
            DispatchEvent::Batch { label: 1, indices: vec![2] },
            DispatchEvent::Batch { label: 0, indices: vec![3] },
            DispatchEvent::End(0),
            DispatchEvent::End(1),
        ]
    );
}

#[test]
fn second_draw_with_unchanged_camera_reuses_the_dispatch() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();
    let (routes, events) = recording_routes(&mut h.context, &[0]);
    submit_overlay_entries(&mut h.context, &[(routes[0], 1, 0), (routes[0], 1, 1)]);
    h.context.render_list_end();

    h.context.draw_render_list(None, None).unwrap();
    let events_after_first = events.borrow().len();
    let draws_after_first = h.calls.borrow().len();

    h.context.draw_render_list(None, None).unwrap();

    // No BEGIN/BATCH/END re-invocation, but execution ran again.
    assert_eq!(events.borrow().len(), events_after_first);
    assert_eq!(h.calls.borrow().len(), draws_after_first * 2);
}

#[test]
fn camera_change_with_identical_order_skips_re_dispatch() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();
    let (routes, events) = recording_routes(&mut h.context, &[0]);
    // Explicit orders do not depend on the camera, so re-sorting under the
    // new matrix yields the same permutation.
    submit_overlay_entries(&mut h.context, &[(routes[0], 1, 0), (routes[0], 1, 1)]);
    h.context.render_list_end();

    h.context.draw_render_list(None, None).unwrap();
    let events_after_first = events.borrow().len();

    h.context.set_view_matrix(Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
    h.context.draw_render_list(None, None).unwrap();

    assert_eq!(events.borrow().len(), events_after_first);
}

#[test]
fn camera_change_that_reorders_world_content_re_dispatches() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();
    let (routes, events) = recording_routes(&mut h.context, &[0]);
    // Distinct batch keys force one batch per entry, so the recorded batch
    // sequence exposes the draw order.
    let range = h.context.render_list_alloc(2);
    for (i, (slot, z)) in h
        .context
        .render_list_entries_mut(range.clone())
        .iter_mut()
        .zip([0.5_f32, 0.9])
        .enumerate()
    {
        slot.major_order = RenderOrder::World;
        slot.dispatch = routes[0];
        slot.batch_key = i as u32;
        slot.world_position = Point3::new(0.0, 0.0, z);
    }
    h.context.render_list_submit(range);
    h.context.render_list_end();

    h.context.draw_render_list(None, None).unwrap();
    {
        let events = events.borrow();
        // Farther entry (index 1) first: world content draws back to front.
        assert_eq!(
            events[1],
            DispatchEvent::Batch { label: 0, indices: vec![1] }
        );
        assert_eq!(
            events[2],
            DispatchEvent::Batch { label: 0, indices: vec![0] }
        );
    }

    // Flip the view's z axis: depth order inverts, the cached order is stale,
    // and the dispatch protocol must run again.
    h.context
        .set_view_matrix(Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 1.0, -1.0)));
    h.context.draw_render_list(None, None).unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 8); // two full BEGIN/BATCH×2/END cycles
    assert_eq!(
        events[5],
        DispatchEvent::Batch { label: 0, indices: vec![0] }
    );
    assert_eq!(
        events[6],
        DispatchEvent::Batch { label: 0, indices: vec![1] }
    );
}

#[test]
fn world_entries_draw_back_to_front_through_one_batch() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();
    let (routes, events) = recording_routes(&mut h.context, &[0]);
    submit_world_entries(&mut h.context, routes[0], &[0.5, 0.9]);
    h.context.render_list_end();

    h.context.draw_render_list(None, None).unwrap();

    let events = events.borrow();
    // Same route and batch key: one batch, farther entry leading.
    assert_eq!(
        *events,
        vec![
            DispatchEvent::Begin(0),
            DispatchEvent::Batch { label: 0, indices: vec![1, 0] },
            DispatchEvent::End(0),
        ]
    );
}

#[test]
fn route_registration_fails_cleanly_past_capacity() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();

    let mut handles = Vec::new();
    for _ in 0..256 {
        handles.push(h.context.register_dispatch(Box::new(NoopDispatch)).unwrap());
    }
    assert_eq!(
        h.context
            .register_dispatch(Box::new(NoopDispatch))
            .unwrap_err(),
        RenderError::BufferFull
    );

    // Previously returned ids are untouched: still 256 distinct indices.
    assert_eq!(handles.len(), 256);
    assert_eq!(handles[0].index(), 0);
    assert_eq!(handles[255].index(), 255);
}

#[test]
fn object_list_overflow_latches_after_the_first_warning() {
    let params = RenderContextParams {
        max_instances: 2,
        ..Default::default()
    };
    let mut h = harness(params);

    let object = || {
        let mut ro = RenderObject::new(MaterialHandle(0));
        ro.vertex_count = 3;
        ro
    };

    assert!(h.context.add_to_render(object()).is_ok());
    assert!(h.context.add_to_render(object()).is_ok());
    assert!(!h.context.is_out_of_resources());

    // First overflow raises the latch; the second fails silently.
    assert_eq!(h.context.add_to_render(object()), Err(RenderError::OutOfResources));
    assert!(h.context.is_out_of_resources());
    assert_eq!(h.context.add_to_render(object()), Err(RenderError::OutOfResources));

    // Frame reset re-arms the warning and frees the list.
    h.context.clear_render_objects();
    assert!(!h.context.is_out_of_resources());
    assert!(h.context.add_to_render(object()).is_ok());
}

#[test]
fn predicate_filters_by_material_tag_mask() {
    let mut h = harness(RenderContextParams::default());

    let mut tagged = RenderObject::new(MaterialHandle(0b01));
    tagged.vertex_count = 3;
    let mut other = RenderObject::new(MaterialHandle(0b10));
    other.vertex_count = 6;
    h.context.add_to_render(tagged).unwrap();
    h.context.add_to_render(other).unwrap();

    let mut predicate = Predicate::new();
    predicate.push(0b01).unwrap();
    h.context.draw(Some(&predicate), None).unwrap();

    let draws: Vec<_> = h
        .calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, BackendCall::Draw { .. }))
        .cloned()
        .collect();
    assert_eq!(draws, vec![BackendCall::Draw { first: 0, count: 3 }]);
}

#[test]
fn executor_applies_overrides_and_picks_the_draw_call() {
    let mut h = harness(RenderContextParams::default());

    let mut indexed = RenderObject::new(MaterialHandle(0));
    indexed.vertex_count = 12;
    indexed.index_buffer = Some(IndexBufferHandle(7));
    indexed.textures[0] = Some(TextureHandle(40));
    indexed.textures[1] = Some(TextureHandle(41));
    indexed.set_stencil_test = true;
    indexed.stencil_test_params.color_mask = ColorMask::RED | ColorMask::ALPHA;
    indexed.set_blend_factors = true;
    indexed.source_blend_factor = BlendFactor::SrcAlpha;
    indexed.destination_blend_factor = BlendFactor::OneMinusSrcAlpha;
    h.context.add_to_render(indexed).unwrap();

    // Context override replaces the object's unit 0 texture only.
    h.context.set_texture_override(0, Some(TextureHandle(99)));
    h.context.draw(None, None).unwrap();

    let calls = h.calls.borrow();
    assert!(calls.contains(&BackendCall::DrawElements { count: 12 }));
    assert!(!calls.iter().any(|c| matches!(c, BackendCall::Draw { .. })));
    assert!(calls.contains(&BackendCall::EnableTexture(0, 99)));
    assert!(calls.contains(&BackendCall::EnableTexture(1, 41)));
    assert!(calls.contains(&BackendCall::SetColorMask(true, false, false, true)));
    assert!(calls.contains(&BackendCall::SetBlendFunc(
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha
    )));
    assert!(calls.contains(&BackendCall::DisableTexture(0, 99)));
}

#[test]
fn frame_flush_appends_before_execution() {
    struct OneTriangle;
    impl super::FrameFlush for OneTriangle {
        fn flush(&mut self, objects: &mut RenderObjectList) {
            let mut ro = RenderObject::new(MaterialHandle(0));
            ro.vertex_count = 3;
            objects.push(ro).unwrap();
        }
    }

    let mut h = harness(RenderContextParams::default());
    h.context.register_frame_flush(Box::new(OneTriangle));
    assert_eq!(h.context.render_object_count(), 0);

    h.context.draw(None, None).unwrap();

    assert_eq!(h.context.render_object_count(), 1);
    assert!(h
        .calls
        .borrow()
        .contains(&BackendCall::Draw { first: 0, count: 3 }));
}

#[test]
fn empty_frame_draws_nothing_and_invokes_no_routes() {
    let mut h = harness(RenderContextParams::default());
    h.context.render_list_begin();
    let (_, events) = recording_routes(&mut h.context, &[0]);
    h.context.render_list_end();

    h.context.draw_render_list(None, None).unwrap();

    assert!(events.borrow().is_empty());
    assert!(h.calls.borrow().is_empty());
}
