//! Draw: sort reuse, batch dispatch, and execution
//!
//! [`RenderContext::draw_render_list`] is the per-frame state machine. Games
//! re-issue draw requests every frame with an often unchanged camera and
//! content, so two reuse levels sit in front of the expensive work:
//!
//! 1. If the view-projection matrix is bit-for-bit the one the last dispatch
//!    was built with, the previously built render object list is drawn as-is.
//! 2. Otherwise the list is re-sorted; if the fresh permutation is identical
//!    to the previous frame's, the existing batches are still valid and the
//!    dispatch protocol is skipped.
//!
//! Only when both checks miss does the context re-run BEGIN / BATCH / END
//! across the registered routes and rebuild the object list.

use crate::foundation::math::mat4_bits_eq;

use super::backend::GraphicsBackend;
use super::constants::NamedConstantBuffer;
use super::list::{RenderListBatch, BATCH_KEY_MASK};
use super::material::Predicate;
use super::object::{ColorMask, StencilTestParams};
use super::sort;
use super::{RenderContext, RenderObjectList, RenderResult};

/// Producer with pending draw data to hand off before execution
///
/// The debug line and text renderers accumulate geometry across the frame and
/// convert it into render objects only when a draw actually runs; they
/// register here and get called at the top of every execution pass.
pub trait FrameFlush {
    /// Append any pending render objects to the frame list
    fn flush(&mut self, objects: &mut RenderObjectList);
}

impl RenderContext {
    /// Order, batch, dispatch, and draw the collected render list.
    ///
    /// `predicate` restricts execution to render objects whose material tag
    /// mask is a superset of the predicate's mask; `constants` is applied to
    /// every drawn object after its own constants.
    ///
    /// # Errors
    /// Currently infallible at this level; the `Result` carries future
    /// capacity failures surfaced during dispatch.
    pub fn draw_render_list(
        &mut self,
        predicate: Option<&Predicate>,
        constants: Option<&NamedConstantBuffer>,
    ) -> RenderResult<()> {
        let target = self.sort_target;
        let previous = 1 - target;

        if self.sort_buffers[previous].is_empty() {
            // First draw since collection ended.
            sort::make_sort_values(&mut self.sort_values, &self.list, &self.view_proj);
        } else if mat4_bits_eq(&self.dispatched_view_proj, &self.view_proj) {
            // Same camera as the last dispatch: the object list is still
            // valid, skip straight to execution.
            return self.draw(predicate, constants);
        } else {
            sort::make_sort_values(&mut self.sort_values, &self.list, &self.view_proj);
        }

        {
            let buffer = &mut self.sort_buffers[target];
            buffer.clear();
            buffer.extend_from_slice(self.list.submitted());
            sort::sort_order(&self.sort_values, buffer);
        }

        // Identical permutation: previous batches and objects still hold.
        if self.sort_buffers[previous] == self.sort_buffers[target] {
            return self.draw(predicate, constants);
        }

        self.dispatched_view_proj = self.view_proj;
        self.objects.clear();
        self.sort_target = previous;

        self.dispatch_sorted(target);

        self.draw(predicate, constants)
    }

    /// Run the BEGIN / BATCH / END protocol over the freshly sorted order in
    /// `sort_buffers[target]`, rebuilding the frame object list.
    fn dispatch_sorted(&mut self, target: usize) {
        // The dispatch table is moved out for the duration of the protocol so
        // callbacks can borrow the entry buffer and the object list without
        // aliasing it.
        let mut dispatches = std::mem::take(&mut self.dispatches);

        for dispatch in &mut dispatches {
            dispatch.on_begin(&mut self.objects);
        }

        let entries = self.list.entries();
        let order = self.sort_buffers[target].as_slice();
        let count = order.len();

        // A run is a maximal consecutive stretch sharing (route, batch key).
        let mut run_start = 0usize;
        for i in 1..=count {
            let run_entry = &entries[order[run_start] as usize];
            if i < count {
                let next = &entries[order[i] as usize];
                if next.dispatch == run_entry.dispatch
                    && next.batch_key & BATCH_KEY_MASK == run_entry.batch_key & BATCH_KEY_MASK
                {
                    continue;
                }
            }

            let route = usize::from(run_entry.dispatch.index());
            debug_assert!(
                route < dispatches.len(),
                "entry references dispatch route {route} but only {} are registered",
                dispatches.len()
            );
            dispatches[route].on_batch(RenderListBatch {
                entries,
                range: &order[run_start..i],
                objects: &mut self.objects,
            });
            run_start = i;
        }

        for dispatch in &mut dispatches {
            dispatch.on_end(&mut self.objects);
        }

        self.dispatches = dispatches;
    }

    /// Execute the accumulated render object list against the backend.
    ///
    /// Runs the registered frame flushers first (debug/text handoff), then
    /// walks the objects in list order, applying per-object state and issuing
    /// one draw call each.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for parity with
    /// [`RenderContext::draw_render_list`].
    pub fn draw(
        &mut self,
        predicate: Option<&Predicate>,
        constants: Option<&NamedConstantBuffer>,
    ) -> RenderResult<()> {
        let tag_mask = predicate.map_or(0, |p| self.materials.tags_to_mask(p.tags()));

        // Two-phase handoff: pending debug/text geometry becomes render
        // objects before the list is walked.
        let mut flushers = std::mem::take(&mut self.flushers);
        for flush in &mut flushers {
            flush.flush(&mut self.objects);
        }
        self.flushers = flushers;

        for ro in self.objects.objects() {
            if ro.vertex_count == 0 {
                continue;
            }
            if self.materials.tag_mask(ro.material) & tag_mask != tag_mask {
                continue;
            }

            let material = self.material_override.unwrap_or(ro.material);
            let program = self.materials.program(material);

            self.graphics.enable_program(program);
            self.materials
                .apply_constants(self.graphics.as_mut(), material, ro);
            self.materials.apply_samplers(self.graphics.as_mut(), material);

            for constant in ro.constants().iter().flatten() {
                self.graphics.set_constant(constant.location, &constant.value);
            }

            if let Some(buffer) = constants {
                buffer.apply(self.graphics.as_mut(), self.materials.as_ref(), material);
            }

            if ro.set_blend_factors {
                self.graphics
                    .set_blend_func(ro.source_blend_factor, ro.destination_blend_factor);
            }

            if ro.set_stencil_test {
                apply_stencil_test(self.graphics.as_mut(), &ro.stencil_test_params);
            }

            let overrides = &self.texture_overrides;
            for (unit, slot) in ro.textures.iter().enumerate() {
                if let Some(texture) = overrides[unit].or(*slot) {
                    self.graphics.enable_texture(unit as u32, texture);
                }
            }

            self.graphics
                .enable_vertex_declaration(ro.vertex_declaration, ro.vertex_buffer, program);

            if let Some(index_buffer) = ro.index_buffer {
                self.graphics.draw_elements(
                    ro.primitive_type,
                    ro.vertex_count,
                    ro.index_type,
                    index_buffer,
                );
            } else {
                self.graphics
                    .draw(ro.primitive_type, ro.vertex_start, ro.vertex_count);
            }

            self.graphics.disable_vertex_declaration(ro.vertex_declaration);

            for (unit, slot) in ro.textures.iter().enumerate() {
                if let Some(texture) = overrides[unit].or(*slot) {
                    self.graphics.disable_texture(unit as u32, texture);
                }
            }
        }

        Ok(())
    }
}

/// Translate stencil parameters into backend state, expanding the 4-bit color
/// mask into per-channel toggles.
fn apply_stencil_test(graphics: &mut dyn GraphicsBackend, stp: &StencilTestParams) {
    graphics.set_color_mask(
        stp.color_mask.contains(ColorMask::RED),
        stp.color_mask.contains(ColorMask::GREEN),
        stp.color_mask.contains(ColorMask::BLUE),
        stp.color_mask.contains(ColorMask::ALPHA),
    );
    graphics.set_stencil_mask(stp.buffer_mask);
    graphics.set_stencil_func(stp.func, stp.reference, stp.reference_mask);
    graphics.set_stencil_op(stp.op_stencil_fail, stp.op_depth_fail, stp.op_depth_pass);
}
