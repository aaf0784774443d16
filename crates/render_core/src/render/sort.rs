//! Sort value derivation
//!
//! Each submitted entry gets a [`RenderListSortValue`]: a directly comparable
//! record derived from the entry's raw data and the current view-projection.
//! World entries are ordered by their normalized `z/w`, mapped so that farther
//! content sorts first (painter's order); explicit-order entries use their
//! producer-supplied integer verbatim. Everything is packed into one `u64` so
//! a single ascending integer sort produces the final submission order:
//! order bands first, then depth or explicit order, then dispatch route, then
//! batch key — which lands batchable entries next to each other.

use crate::foundation::math::{Mat4, Vec4};

use super::list::{RenderList, RenderOrder, BATCH_KEY_MASK};

/// Top of the reserved world-depth key band
const WORLD_KEY_BASE: u32 = 0x00ff_fff8;

/// Width of the world-depth key band
const WORLD_KEY_RANGE: u32 = 0x00ff_fff0;

/// Derived, directly comparable ordering record for one entry
///
/// Kept in an array parallel to (and indexed identically to) the entry
/// buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderListSortValue {
    /// Projected `z/w`, kept from the first derivation pass
    pub zw: f32,
    /// 24-bit packed order key
    pub order: u32,
    /// Batch key masked to its significant 24 bits
    pub batch_key: u32,
    /// Major ordering band, copied from the entry
    pub major_order: RenderOrder,
    /// Dispatch route index, copied from the entry
    pub dispatch: u8,
}

impl RenderListSortValue {
    /// Pack into one orderable integer:
    /// `major_order(8) | order(24) | dispatch(8) | batch_key(24)`.
    #[must_use]
    pub const fn sort_key(&self) -> u64 {
        ((self.major_order as u64) << 56)
            | (((self.order & BATCH_KEY_MASK) as u64) << 32)
            | ((self.dispatch as u64) << 24)
            | ((self.batch_key & BATCH_KEY_MASK) as u64)
    }
}

/// Derive sort values for every submitted entry.
///
/// Two passes: the first projects world entries through `view_proj`, records
/// `z/w`, and tracks its min/max; the second packs order keys. Depth keys are
/// only spread across the band when more than one world entry exists and the
/// depth range is non-degenerate, otherwise every world entry gets the band
/// base.
///
/// Must be re-run whenever the submitted entry set changes; values are only
/// reusable across repeated draws of the same set.
pub(crate) fn make_sort_values(
    values: &mut Vec<RenderListSortValue>,
    list: &RenderList,
    view_proj: &Mat4,
) {
    let entries = list.entries();
    values.clear();
    values.resize(entries.len(), RenderListSortValue::default());

    let mut min_zw = f32::MAX;
    let mut max_zw = f32::MIN;
    let mut world_count = 0u32;

    for &idx in list.submitted() {
        let entry = &entries[idx as usize];
        if entry.major_order != RenderOrder::World {
            continue;
        }

        let p = entry.world_position;
        let clip = view_proj * Vec4::new(p.x, p.y, p.z, 1.0);
        let zw = clip.z / clip.w;
        values[idx as usize].zw = zw;
        if zw < min_zw {
            min_zw = zw;
        }
        if zw > max_zw {
            max_zw = zw;
        }
        world_count += 1;
    }

    let rc = if world_count > 1 && max_zw != min_zw {
        1.0 / (max_zw - min_zw)
    } else {
        0.0
    };

    for &idx in list.submitted() {
        let entry = &entries[idx as usize];
        let value = &mut values[idx as usize];

        value.major_order = entry.major_order;
        value.order = if entry.major_order == RenderOrder::World {
            (WORLD_KEY_BASE as f32 - WORLD_KEY_RANGE as f32 * rc * (value.zw - min_zw)) as u32
        } else {
            entry.order
        };
        value.batch_key = entry.batch_key & BATCH_KEY_MASK;
        value.dispatch = entry.dispatch.index();
    }
}

/// Sort an index permutation by derived sort key, ascending, breaking ties by
/// the index itself so ordering is deterministic for identical input.
pub(crate) fn sort_order(values: &[RenderListSortValue], order: &mut [u32]) {
    order.sort_unstable_by(|&a, &b| {
        let ka = values[a as usize].sort_key();
        let kb = values[b as usize].sort_key();
        ka.cmp(&kb).then_with(|| a.cmp(&b))
    });
}
