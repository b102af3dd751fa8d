use glam::{Mat4, Vec3, Vec4};

use crate::core::Bounds;

/// World-space axis aligned box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb { min, max }
    }

    /// Bounds of a relem placed by `transform`, stretched over `height_range`
    pub fn from_relem(bounds: &Bounds, transform: &Mat4, height_range: (f32, f32)) -> Self {
        let (min, max) = bounds.transformed(transform, height_range);
        Aabb { min, max }
    }

    pub fn is_visible(&self, frustum_planes: &[Vec4; 6]) -> bool {
        for plane in frustum_planes {
            // corner furthest along the plane normal
            let p = Vec3::select(plane.truncate().cmpgt(Vec3::ZERO), self.max, self.min);
            if plane.truncate().dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}

/// Planes of a wgpu view-projection (depth in 0..1), normals pointing inward.
pub fn extract_frustum_planes(view_proj: &Mat4) -> [Vec4; 6] {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    let planes = [
        r3 + r0, // Left
        r3 - r0, // Right
        r3 + r1, // Bottom
        r3 - r1, // Top
        r2,      // Near
        r3 - r2, // Far
    ];

    planes.map(|plane| {
        let length = plane.truncate().length();
        if length > 0.0 { plane / length } else { plane }
    })
}
