//! Render list buffer and dispatch routes
//!
//! Producers describe their frame's drawable work as lightweight
//! [`RenderListEntry`] records: enough information to order and batch, nothing
//! more. Entries live in one contiguous, growable buffer so the sort stays
//! cache friendly, and are always addressed by index. An allocation returns an
//! index range; a later allocation may relocate the backing storage, so a
//! range must be written and submitted before the next allocation (caller
//! discipline, see the crate's concurrency notes).

use std::ops::Range;

use crate::foundation::math::Point3;

use super::RenderObjectList;

/// Only the low 24 bits of a batch key participate in ordering and batching;
/// the top byte is reserved by the sort key layout
pub const BATCH_KEY_MASK: u32 = 0x00ff_ffff;

/// Entry buffer growth granularity, in entries
const MIN_GROWTH: usize = 256;

/// Major ordering band of a render list entry
///
/// World entries are ordered by projected depth; entries in the other two
/// bands use their explicit `order` value and bracket the world band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RenderOrder {
    /// Explicitly ordered content drawn before all world content
    BeforeWorld = 0,
    /// Depth-sorted world content
    #[default]
    World = 1,
    /// Explicitly ordered content drawn after all world content (UI, overlays)
    AfterWorld = 2,
}

/// Stable identifier of a registered dispatch route
///
/// Routes are referenced by small index, never by pointer, so registering more
/// routes can never invalidate entries already written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderListDispatchHandle(u8);

impl RenderListDispatchHandle {
    pub(crate) const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Index of the route in the dispatch table
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// One drawable work item submitted by a producer
///
/// Ephemeral: valid only within the current begin/end bracket. Indices into
/// the entry buffer stay stable across growth even though the storage may
/// relocate.
#[derive(Debug, Clone, Copy)]
pub struct RenderListEntry {
    /// World position used for depth sorting of [`RenderOrder::World`] entries
    pub world_position: Point3,
    /// Explicit order, used verbatim when `major_order` is not `World`
    pub order: u32,
    /// Producer-defined grouping hint; low 24 bits significant
    pub batch_key: u32,
    /// Major ordering band
    pub major_order: RenderOrder,
    /// Route whose callback turns this entry into render objects
    pub dispatch: RenderListDispatchHandle,
    /// Opaque producer payload, carried through sorting untouched
    pub user_data: u64,
}

impl Default for RenderListEntry {
    fn default() -> Self {
        Self {
            world_position: Point3::origin(),
            order: 0,
            batch_key: 0,
            major_order: RenderOrder::default(),
            dispatch: RenderListDispatchHandle::default(),
            user_data: 0,
        }
    }
}

/// Arguments to a batch dispatch callback
///
/// `range` is the sorted run of entry indices this callback is responsible
/// for; `entries` is the whole frame's entry buffer for index lookups. The
/// one sanctioned side effect is pushing render objects into `objects`.
pub struct RenderListBatch<'a> {
    /// Full entry buffer for the frame
    pub entries: &'a [RenderListEntry],
    /// Sorted entry indices belonging to this run
    pub range: &'a [u32],
    /// Frame render object list to append to
    pub objects: &'a mut RenderObjectList,
}

/// Producer callback registered as a dispatch route
///
/// During a draw, every registered route receives `on_begin` once, then one
/// `on_batch` per sorted run of its entries sharing a batch key, then `on_end`
/// once. Callbacks run synchronously on the render thread and must not
/// re-enter the render list API for the in-flight frame.
pub trait RenderListDispatch {
    /// Dispatch is starting; no entries yet
    fn on_begin(&mut self, objects: &mut RenderObjectList) {
        let _ = objects;
    }

    /// Convert one sorted run of entries into render objects
    fn on_batch(&mut self, batch: RenderListBatch<'_>);

    /// Dispatch is complete
    fn on_end(&mut self, objects: &mut RenderObjectList) {
        let _ = objects;
    }
}

/// Frame-scoped entry buffer plus the submitted-index list
///
/// Storage is truncated, never deallocated, between frames; steady-state
/// frames allocate nothing.
#[derive(Default)]
pub struct RenderList {
    entries: Vec<RenderListEntry>,
    submitted: Vec<u32>,
}

impl RenderList {
    /// Truncate for a new frame
    pub(crate) fn begin(&mut self) {
        self.entries.clear();
        self.submitted.clear();
    }

    /// Allocate a contiguous range of `count` default-initialized entries and
    /// return its index range.
    ///
    /// Grows the backing storage by at least `max(256, count - remaining)`
    /// entries when capacity is short, and keeps the submitted-index buffer's
    /// capacity in step so a matching submit can never run out of headroom.
    pub(crate) fn alloc(&mut self, count: usize) -> Range<u32> {
        let remaining = self.entries.capacity() - self.entries.len();
        if remaining < count {
            let target = self.entries.capacity() + MIN_GROWTH.max(count - remaining);
            self.entries.reserve_exact(target - self.entries.len());

            let capacity = self.entries.capacity();
            if self.submitted.capacity() < capacity {
                self.submitted.reserve_exact(capacity - self.submitted.len());
            }
        }

        let start = self.entries.len() as u32;
        self.entries
            .resize_with(self.entries.len() + count, RenderListEntry::default);
        start..start + count as u32
    }

    /// Writable view of an allocated range
    pub(crate) fn entries_mut(&mut self, range: Range<u32>) -> &mut [RenderListEntry] {
        &mut self.entries[range.start as usize..range.end as usize]
    }

    /// Append a range's indices to the submitted list
    pub(crate) fn submit(&mut self, range: Range<u32>) {
        debug_assert!(
            range.len() <= self.submitted.capacity() - self.submitted.len(),
            "submit without headroom: alloc and submit calls are mismatched"
        );
        self.submitted.extend(range);
    }

    /// All entries allocated this frame
    pub(crate) fn entries(&self) -> &[RenderListEntry] {
        &self.entries
    }

    /// Indices submitted this frame, in submission order
    pub(crate) fn submitted(&self) -> &[u32] {
        &self.submitted
    }

    /// Capacity of the submitted-index buffer; the sort-order buffers are
    /// sized against this at end-of-collection
    pub(crate) fn submitted_capacity(&self) -> usize {
        self.submitted.capacity()
    }
}
