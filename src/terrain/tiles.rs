//! Procedural tile meshes for the geometric clipmap.
//!
//! Builds the five stitchable meshes (cross, square, filler, trim, seam) into
//! one flat vertex/index pool. Every relem is self-contained: indices are
//! local to the relem and `vertex_offset` is used as the base vertex.
//!
//! Triangles are counter-clockwise in the local (x, y) plane, which is
//! clockwise when seen from above once mapped to world (x, 0, z).

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::constants::TERRAIN_MATERIAL;
use crate::core::{Bounds, Mesh, MeshKind, RenderElement, Vertex};
use crate::terrain::config::{is_valid_grid_size, tile_size_for};

/// Immutable geometry tables produced once at load
#[derive(Clone, Debug, Default)]
pub struct TileGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub relems: Vec<RenderElement>,
    pub bounds: Vec<Bounds>,
    pub meshes: Vec<Mesh>,
}

impl TileGeometry {
    pub fn mesh(&self, kind: MeshKind) -> &Mesh {
        &self.meshes[kind.index() as usize]
    }

    /// Vertices emitted for one relem (relems are laid out back to back)
    pub fn relem_vertex_count(&self, relem: usize) -> u32 {
        let start = self.relems[relem].vertex_offset;
        let end = self
            .relems
            .get(relem + 1)
            .map_or(self.vertices.len() as u32, |next| next.vertex_offset);
        end - start
    }

    pub fn relem_vertices(&self, relem: usize) -> &[Vertex] {
        let start = self.relems[relem].vertex_offset as usize;
        &self.vertices[start..start + self.relem_vertex_count(relem) as usize]
    }

    pub fn relem_indices(&self, relem: usize) -> &[u32] {
        let relem = &self.relems[relem];
        let start = relem.index_offset as usize;
        &self.indices[start..start + relem.index_count as usize]
    }
}

/// What one emission step produced
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EmitCounts {
    pub vertices: u32,
    pub indices: u32,
}

/// Writes a single relem: vertices first, then triangles in local indices
pub struct RelemWriter<'a> {
    vertices: &'a mut Vec<Vertex>,
    indices: &'a mut Vec<u32>,
    first_vertex: usize,
    max_index: Option<u32>,
}

impl RelemWriter<'_> {
    fn vertex_count(&self) -> u32 {
        (self.vertices.len() - self.first_vertex) as u32
    }

    fn position(&self, local: u32) -> Vec2 {
        Vec2::from(self.vertices[self.first_vertex + local as usize].position)
    }

    /// Push a vertex and return its local index
    pub fn vertex(&mut self, x: f32, y: f32) -> u32 {
        let local = self.vertex_count();
        self.vertices.push(Vertex::new(x, y));
        local
    }

    /// Push a triangle, flipped to counter-clockwise if needed.
    /// Degenerate triangles keep the given order.
    pub fn triangle(&mut self, a: u32, b: u32, c: u32) {
        let count = self.vertex_count();
        assert!(
            a < count && b < count && c < count,
            "triangle ({a}, {b}, {c}) references vertices outside its relem ({count} emitted)"
        );

        let (pa, pb, pc) = (self.position(a), self.position(b), self.position(c));
        let (b, c) = if (pb - pa).perp_dot(pc - pa) < 0.0 {
            (c, b)
        } else {
            (b, c)
        };

        self.indices.extend_from_slice(&[a, b, c]);
        let top = a.max(b).max(c);
        self.max_index = Some(self.max_index.map_or(top, |m| m.max(top)));
    }

    /// Two triangles over a cell given its corners in ring order
    pub fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
    }

    /// A 2-vertex-wide strip: `pairs` vertex pairs joined by `pairs - 1` cells.
    /// `skip_cell` leaves one cell out (used where another strip covers it).
    pub fn ladder(
        &mut self,
        pairs: u32,
        skip_cell: Option<u32>,
        pair_at: impl Fn(f32) -> [Vec2; 2],
    ) {
        let first = self.vertex_count();
        for i in 0..pairs {
            let [a, b] = pair_at(i as f32);
            self.vertex(a.x, a.y);
            self.vertex(b.x, b.y);
        }

        for i in 0..pairs.saturating_sub(1) {
            if skip_cell == Some(i) {
                continue;
            }
            let a0 = first + 2 * i;
            self.quad(a0, a0 + 2, a0 + 3, a0 + 1);
        }
    }
}

/// Builds the clipmap tile catalog.
pub struct TileMeshBuilder {
    vertex_grid_size: u32,
    tile_size: u32,
    geometry: TileGeometry,
}

impl TileMeshBuilder {
    /// Panics if `vertex_grid_size` is not `2^k - 1`; settings are validated
    /// before reaching this point.
    pub fn new(vertex_grid_size: u32) -> Self {
        assert!(
            is_valid_grid_size(vertex_grid_size),
            "vertex grid size {vertex_grid_size} must be 2^k - 1"
        );

        Self {
            vertex_grid_size,
            tile_size: tile_size_for(vertex_grid_size),
            geometry: TileGeometry::default(),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn build(mut self) -> TileGeometry {
        self.build_cross();
        self.build_square();
        self.build_filler();
        self.build_trim();
        self.build_seam();

        debug!(
            vertex_grid_size = self.vertex_grid_size,
            tile_size = self.tile_size,
            vertices = self.geometry.vertices.len(),
            indices = self.geometry.indices.len(),
            relems = self.geometry.relems.len(),
            "Built clipmap tile meshes"
        );

        self.geometry
    }

    /// Emit one relem and record its draw range and bounds.
    pub fn emit_relem(&mut self, write: impl FnOnce(&mut RelemWriter)) -> EmitCounts {
        let vertex_offset = self.geometry.vertices.len() as u32;
        let index_offset = self.geometry.indices.len() as u32;

        let max_index = {
            let mut writer = RelemWriter {
                vertices: &mut self.geometry.vertices,
                indices: &mut self.geometry.indices,
                first_vertex: vertex_offset as usize,
                max_index: None,
            };
            write(&mut writer);
            writer.max_index
        };

        let counts = EmitCounts {
            vertices: self.geometry.vertices.len() as u32 - vertex_offset,
            indices: self.geometry.indices.len() as u32 - index_offset,
        };

        // Running offset must land right after the last referenced vertex
        let running_offset = vertex_offset + counts.vertices;
        assert_eq!(
            max_index.map(|m| vertex_offset + m + 1),
            Some(running_offset),
            "relem {} leaves vertices unreferenced or emitted no triangles",
            self.geometry.relems.len()
        );

        let emitted = &self.geometry.vertices[vertex_offset as usize..];
        let (min, max) = emitted.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec2::from(v.position);
                (min.min(p), max.max(p))
            },
        );

        self.geometry.relems.push(RenderElement {
            vertex_offset,
            index_offset,
            index_count: counts.indices,
            material: TERRAIN_MATERIAL,
        });
        self.geometry.bounds.push(Bounds::new(
            Vec3::new(min.x, 0.0, min.y),
            Vec3::new(max.x, 0.0, max.y),
        ));

        counts
    }

    fn begin_mesh(&self, kind: MeshKind) -> u32 {
        assert_eq!(
            self.geometry.meshes.len(),
            kind.index() as usize,
            "mesh {kind} emitted out of catalog order"
        );
        self.geometry.relems.len() as u32
    }

    fn end_mesh(&mut self, kind: MeshKind, first_relem: u32) {
        let relem_count = self.geometry.relems.len() as u32 - first_relem;
        assert_eq!(relem_count, kind.relem_count(), "mesh {kind} relem count");
        self.geometry.meshes.push(Mesh {
            first_relem,
            relem_count,
        });
    }

    /// Two ladders through the origin cell, covering the centre row and
    /// column of the innermost level.
    fn build_cross(&mut self) {
        let first = self.begin_mesh(MeshKind::Cross);
        let t = self.tile_size as f32;
        let pairs = 2 * self.tile_size + 2;

        self.emit_relem(|w| {
            w.ladder(pairs, None, |i| {
                [Vec2::new(i - t, 0.0), Vec2::new(i - t, 1.0)]
            })
        });
        // Origin cell already drawn by the horizontal ladder
        let centre = self.tile_size;
        self.emit_relem(|w| {
            w.ladder(pairs, Some(centre), |i| {
                [Vec2::new(0.0, i - t), Vec2::new(1.0, i - t)]
            })
        });

        self.end_mesh(MeshKind::Cross, first);
    }

    fn build_square(&mut self) {
        let first = self.begin_mesh(MeshKind::Square);
        let size = self.tile_size;

        self.emit_relem(|w| {
            for y in 0..=size {
                for x in 0..=size {
                    w.vertex(x as f32, y as f32);
                }
            }

            let row = size + 1;
            for y in 0..size {
                for x in 0..size {
                    let i = y * row + x;
                    w.quad(i, i + 1, i + row + 1, i + row);
                }
            }
        });

        self.end_mesh(MeshKind::Square, first);
    }

    /// Four arms filling the one-cell gap between the outer blocks of a level
    fn build_filler(&mut self) {
        let first = self.begin_mesh(MeshKind::Filler);
        let t = self.tile_size as f32;
        let pairs = self.tile_size + 1;

        // right
        self.emit_relem(|w| {
            w.ladder(pairs, None, |i| {
                [Vec2::new(t + 1.0 + i, 0.0), Vec2::new(t + 1.0 + i, 1.0)]
            })
        });
        // top
        self.emit_relem(|w| {
            w.ladder(pairs, None, |i| {
                [Vec2::new(0.0, t + 1.0 + i), Vec2::new(1.0, t + 1.0 + i)]
            })
        });
        // left
        self.emit_relem(|w| {
            w.ladder(pairs, None, |i| {
                [Vec2::new(-t - i, 0.0), Vec2::new(-t - i, 1.0)]
            })
        });
        // bottom
        self.emit_relem(|w| {
            w.ladder(pairs, None, |i| {
                [Vec2::new(0.0, -t - i), Vec2::new(1.0, -t - i)]
            })
        });

        self.end_mesh(MeshKind::Filler, first);
    }

    /// L-shaped border around the level, authored around the centre of the
    /// origin cell and closing the left column and bottom row. The tracker
    /// rotates it in 90 degree steps towards the side the coarser level leaves open.
    fn build_trim(&mut self) {
        let first = self.begin_mesh(MeshKind::Trim);
        let h = 2.0 * self.tile_size as f32 + 0.5;
        let side = 4 * self.tile_size;

        // vertical, full height including the corner
        self.emit_relem(|w| {
            w.ladder(side + 3, None, |i| {
                [Vec2::new(-h - 1.0, -h - 1.0 + i), Vec2::new(-h, -h - 1.0 + i)]
            })
        });
        // horizontal
        self.emit_relem(|w| {
            w.ladder(side + 2, None, |i| {
                [Vec2::new(-h + i, -h - 1.0), Vec2::new(-h + i, -h)]
            })
        });

        self.end_mesh(MeshKind::Trim, first);
    }

    /// Degenerate fan around the level boundary. Adds the fine vertices the
    /// coarser level lacks so heights close the T-junctions.
    fn build_seam(&mut self) {
        let first = self.begin_mesh(MeshKind::Seam);
        let side = self.vertex_grid_size - 1;
        let perimeter = 4 * side;

        self.emit_relem(|w| {
            let p = side as f32;
            for i in 0..side {
                w.vertex(i as f32, 0.0);
            }
            for i in 0..side {
                w.vertex(p, i as f32);
            }
            for i in 0..side {
                w.vertex(p - i as f32, p);
            }
            for i in 0..side {
                w.vertex(0.0, p - i as f32);
            }

            for i in (0..perimeter).step_by(2) {
                w.triangle(i, i + 1, (i + 2) % perimeter);
            }
        });

        self.end_mesh(MeshKind::Seam, first);
    }
}
