//! Per-frame re-anchoring of clipmap instances around the viewer.
//!
//! Every level snaps to its own grid (`floor(camera / scale) * scale`), so a
//! level only moves when the camera crosses one of its cells. Transforms are
//! written in place; no allocation happens per frame.

use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};

use crate::core::MeshKind;
use crate::terrain::schedule::{InstanceSchedule, InstanceSlot, KindRanges, level_scale};

/// Quarter turns about +Y applied to the trim, indexed by the 2-bit code
/// from [`trim_rotation`]. Index 0 closes the left column and bottom row.
pub const TRIM_ROTATIONS: [Mat4; 4] = [
    Mat4::IDENTITY,
    // (x, z) -> (z, -x): left + top
    Mat4::from_cols(
        Vec4::new(0.0, 0.0, -1.0, 0.0),
        Vec4::Y,
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::W,
    ),
    // (x, z) -> (-z, x): right + bottom
    Mat4::from_cols(
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::Y,
        Vec4::new(-1.0, 0.0, 0.0, 0.0),
        Vec4::W,
    ),
    // (x, z) -> (-x, -z): right + top
    Mat4::from_cols(
        Vec4::new(-1.0, 0.0, 0.0, 0.0),
        Vec4::Y,
        Vec4::new(0.0, 0.0, -1.0, 0.0),
        Vec4::W,
    ),
];

/// Snap a horizontal position down onto the grid of `scale`
pub fn snap(position: Vec2, scale: f32) -> Vec2 {
    (position / scale).floor() * scale
}

/// Which side the next coarser level leaves open.
///
/// `diff` is `snapped(l) - snapped(l + 1)`, each axis is either 0 or `scale`.
/// Bit 1 set: the gap is on +x. Bit 0 set: the gap is on +z.
pub fn trim_rotation(diff: Vec2, scale: f32) -> usize {
    (usize::from(diff.x < scale) << 1) | usize::from(diff.y < scale)
}

/// Local (x, y) grid to world: translate in xz, scale x and z
pub fn placement(translation: Vec2, scale: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(translation.x, 0.0, translation.y))
        * Mat4::from_scale(Vec3::new(scale, 1.0, scale))
}

/// Snapping state of a single level for a camera position
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevelPlacement {
    pub scale: f32,
    pub snapped: Vec2,
    pub next_snapped: Vec2,
    pub trim_rotation: usize,
}

impl LevelPlacement {
    pub fn new(camera: Vec2, level: u32) -> Self {
        let scale = level_scale(level);
        let snapped = snap(camera, scale);
        let next_snapped = snap(camera, scale * 2.0);
        Self {
            scale,
            snapped,
            next_snapped,
            trim_rotation: trim_rotation(snapped - next_snapped, scale),
        }
    }

    /// Centre of the origin cell, where the trim is authored around
    pub fn tile_center(&self) -> Vec2 {
        self.snapped + Vec2::splat(self.scale * 0.5)
    }
}

/// 4x4 block grid cells, either the interior 2x2 or the outer ring of 12
fn grid_cells(interior: bool) -> impl Iterator<Item = UVec2> {
    (0..16u32)
        .map(|i| UVec2::new(i % 4, i / 4))
        .filter(move |cell| {
            let inside = (1..=2).contains(&cell.x) && (1..=2).contains(&cell.y);
            inside == interior
        })
}

pub struct ClipmapTracker {
    tile_size: u32,
    levels: u32,
    ranges: KindRanges,
}

impl ClipmapTracker {
    pub fn new(tile_size: u32, schedule: &InstanceSchedule) -> Self {
        Self {
            tile_size,
            levels: schedule.levels(),
            ranges: schedule.ranges().clone(),
        }
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Recompute every instance transform for a viewer at `camera` (world x, z).
    ///
    /// Panics if `slots` does not match the schedule this tracker was built for.
    pub fn update(&self, camera: Vec2, slots: &[InstanceSlot], transforms: &mut [Mat4]) {
        assert_eq!(slots.len(), self.ranges.seams.end, "instance schedule size mismatch");
        assert_eq!(transforms.len(), slots.len(), "transform array size mismatch");

        let i = self.ranges.cross.start;
        expect_slot(slots, i, MeshKind::Cross, 0);
        transforms[i] = placement(camera.floor(), 1.0);

        let finest = LevelPlacement::new(camera, 0);
        for (i, cell) in self.ranges.inner_squares.clone().zip(grid_cells(true)) {
            expect_slot(slots, i, MeshKind::Square, 0);
            transforms[i] = self.block_transform(&finest, cell);
        }

        for level in 0..self.levels {
            let placement_l = LevelPlacement::new(camera, level);
            let l = level as usize;

            for (i, cell) in self.ranges.level_blocks(level).zip(grid_cells(false)) {
                expect_slot(slots, i, MeshKind::Square, level);
                transforms[i] = self.block_transform(&placement_l, cell);
            }

            let i = self.ranges.fillers.start + l;
            expect_slot(slots, i, MeshKind::Filler, level);
            transforms[i] = placement(placement_l.snapped, placement_l.scale);

            let i = self.ranges.trims.start + l;
            expect_slot(slots, i, MeshKind::Trim, level);
            transforms[i] = self.trim_transform(&placement_l);

            let i = self.ranges.seams.start + l;
            expect_slot(slots, i, MeshKind::Seam, level);
            transforms[i] = self.seam_transform(&placement_l);
        }
    }

    /// Distance from a level's snapped position to its block grid origin
    fn half_extent(&self, scale: f32) -> Vec2 {
        Vec2::splat(2.0 * self.tile_size as f32 * scale)
    }

    fn block_transform(&self, level: &LevelPlacement, cell: UVec2) -> Mat4 {
        let s = level.scale;
        let tile_extent = self.tile_size as f32 * s;
        let base = level.snapped - self.half_extent(s);
        // Upper half of the grid sits past the filler gap
        let filler_skip = Vec2::new(
            if cell.x >= 2 { s } else { 0.0 },
            if cell.y >= 2 { s } else { 0.0 },
        );

        placement(base + cell.as_vec2() * tile_extent + filler_skip, s)
    }

    pub fn trim_transform(&self, level: &LevelPlacement) -> Mat4 {
        placement(level.tile_center(), level.scale) * TRIM_ROTATIONS[level.trim_rotation]
    }

    pub fn seam_transform(&self, level: &LevelPlacement) -> Mat4 {
        placement(level.next_snapped - self.half_extent(level.scale), level.scale)
    }
}

fn expect_slot(slots: &[InstanceSlot], index: usize, kind: MeshKind, level: u32) {
    assert_eq!(
        slots[index],
        InstanceSlot { kind, level },
        "instance slot {index} is out of sync with the clipmap schedule"
    );
}
