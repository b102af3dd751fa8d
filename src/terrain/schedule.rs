//! Static instance layout of the clipmap.
//!
//! Slot order: 1 cross, 4 inner squares, 12 blocks per level, then one
//! filler, one trim and one seam per level. The layout never changes after
//! construction, only transforms do.

use std::ops::Range;

use glam::{Mat4, Vec3};

use crate::core::MeshKind;
use crate::terrain::config::instance_count;

pub const INNER_SQUARES: usize = 4;
pub const BLOCKS_PER_LEVEL: usize = 12;

/// Explicit tag of what a slot holds
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceSlot {
    pub kind: MeshKind,
    pub level: u32,
}

/// Slot ranges per kind, handed to the tracker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindRanges {
    pub cross: Range<usize>,
    pub inner_squares: Range<usize>,
    pub blocks: Range<usize>,
    pub fillers: Range<usize>,
    pub trims: Range<usize>,
    pub seams: Range<usize>,
}

impl KindRanges {
    fn new(levels: u32) -> Self {
        let levels = levels as usize;
        let cross = 0..1;
        let inner_squares = cross.end..cross.end + INNER_SQUARES;
        let blocks = inner_squares.end..inner_squares.end + BLOCKS_PER_LEVEL * levels;
        let fillers = blocks.end..blocks.end + levels;
        let trims = fillers.end..fillers.end + levels;
        let seams = trims.end..trims.end + levels;

        Self {
            cross,
            inner_squares,
            blocks,
            fillers,
            trims,
            seams,
        }
    }

    /// Ring blocks of one level
    pub fn level_blocks(&self, level: u32) -> Range<usize> {
        let start = self.blocks.start + BLOCKS_PER_LEVEL * level as usize;
        start..start + BLOCKS_PER_LEVEL
    }
}

#[derive(Clone, Debug)]
pub struct InstanceSchedule {
    levels: u32,
    slots: Vec<InstanceSlot>,
    ranges: KindRanges,
}

impl InstanceSchedule {
    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn slots(&self) -> &[InstanceSlot] {
        &self.slots
    }

    pub fn ranges(&self) -> &KindRanges {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Mesh index per instance, uploaded once for the culling kernel
    pub fn instance_meshes(&self) -> Vec<u32> {
        self.slots.iter().map(|slot| slot.kind.index()).collect()
    }

    /// Identity for the cross, level scale baked in for everything else
    pub fn initial_transforms(&self) -> Vec<Mat4> {
        self.slots
            .iter()
            .map(|slot| match slot.kind {
                MeshKind::Cross => Mat4::IDENTITY,
                _ => {
                    let scale = level_scale(slot.level);
                    Mat4::from_scale(Vec3::new(scale, 1.0, scale))
                }
            })
            .collect()
    }
}

pub fn level_scale(level: u32) -> f32 {
    (1u32 << level) as f32
}

/// Build the fixed slot list for `levels` clipmap levels.
pub fn schedule_instances(levels: u32) -> InstanceSchedule {
    let ranges = KindRanges::new(levels);
    let mut slots = Vec::with_capacity(instance_count(levels));

    slots.push(InstanceSlot {
        kind: MeshKind::Cross,
        level: 0,
    });
    slots.extend((0..INNER_SQUARES).map(|_| InstanceSlot {
        kind: MeshKind::Square,
        level: 0,
    }));
    for level in 0..levels {
        slots.extend((0..BLOCKS_PER_LEVEL).map(|_| InstanceSlot {
            kind: MeshKind::Square,
            level,
        }));
    }
    for kind in [MeshKind::Filler, MeshKind::Trim, MeshKind::Seam] {
        slots.extend((0..levels).map(|level| InstanceSlot { kind, level }));
    }

    debug_assert_eq!(slots.len(), ranges.seams.end);

    InstanceSchedule {
        levels,
        slots,
        ranges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_count_is_5_plus_15_levels() {
        for levels in 0..=10 {
            let schedule = schedule_instances(levels);
            assert_eq!(schedule.len(), 5 + 15 * levels as usize);
            assert_eq!(schedule.instance_meshes().len(), schedule.len());
            assert_eq!(schedule.initial_transforms().len(), schedule.len());
        }
    }

    #[test]
    fn zero_levels_has_only_cross_and_inner_squares() {
        let schedule = schedule_instances(0);
        assert_eq!(schedule.instance_meshes(), vec![0, 1, 1, 1, 1]);
        let ranges = schedule.ranges();
        assert!(ranges.blocks.is_empty());
        assert!(ranges.fillers.is_empty());
        assert!(ranges.trims.is_empty());
        assert!(ranges.seams.is_empty());
        assert_eq!(ranges.seams.end, 5);
    }

    #[test]
    fn ranges_match_slot_tags() {
        let schedule = schedule_instances(3);
        let ranges = schedule.ranges().clone();
        let slots = schedule.slots();

        assert_eq!(slots[ranges.cross.start].kind, MeshKind::Cross);
        for i in ranges.inner_squares.clone() {
            assert_eq!(slots[i], InstanceSlot { kind: MeshKind::Square, level: 0 });
        }
        for level in 0..3 {
            for i in ranges.level_blocks(level) {
                assert_eq!(slots[i], InstanceSlot { kind: MeshKind::Square, level });
            }
            let l = level as usize;
            let slot = |kind| InstanceSlot { kind, level };
            assert_eq!(slots[ranges.fillers.start + l], slot(MeshKind::Filler));
            assert_eq!(slots[ranges.trims.start + l], slot(MeshKind::Trim));
            assert_eq!(slots[ranges.seams.start + l], slot(MeshKind::Seam));
        }
        assert_eq!(ranges.seams.end, slots.len());
    }

    #[test]
    fn initial_transforms_carry_level_scale() {
        let schedule = schedule_instances(4);
        let transforms = schedule.initial_transforms();
        for (slot, transform) in schedule.slots().iter().zip(&transforms) {
            let expected = if slot.kind == MeshKind::Cross { 1.0 } else { level_scale(slot.level) };
            assert_eq!(transform.x_axis.x, expected);
            assert_eq!(transform.z_axis.z, expected);
            assert_eq!(transform.y_axis.y, 1.0);
            assert_eq!(transform.w_axis, glam::Vec4::W);
        }
    }
}
