use nalgebra::{Point3, Rotation3, Vector3};
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

use crate::console_warn;
use crate::extrude::{extrude_outline, ExtrudedSolid};
use crate::geojson_features::{Ring, ZoneShape};
use crate::projection::CoordinateProjector;

/// Axis-aligned bounding box in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }
}

// Output struct for one zone mesh, ready to upload as a buffer geometry
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BufferGeometry {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
    pub has_data: bool,
}

impl BufferGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, index: u32) -> Point3<f64> {
        let i = index as usize * 3;
        Point3::new(
            self.vertices[i] as f64,
            self.vertices[i + 1] as f64,
            self.vertices[i + 2] as f64,
        )
    }

    /// Triangle corners in scene space, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [self.vertex(tri[0]), self.vertex(tri[1]), self.vertex(tri[2])])
    }

    /// Bounding box over all vertices; `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut points = self.vertices.chunks_exact(3);
        let first = points.next()?;
        let mut min = Point3::new(first[0] as f64, first[1] as f64, first[2] as f64);
        let mut max = min;
        for p in points {
            for axis in 0..3 {
                let v = p[axis] as f64;
                min[axis] = min[axis].min(v);
                max[axis] = max[axis].max(v);
            }
        }
        Some(Aabb { min, max })
    }

    /// Append a solid, rotating it from the authoring frame (extrusion along
    /// +Z) into the scene frame (extrusion along +Y).
    fn append_rotated(&mut self, solid: ExtrudedSolid, rotation: &Rotation3<f64>) {
        let vertex_offset = self.vertex_count() as u32;

        for p in solid.positions.chunks_exact(3) {
            let r = rotation * Point3::new(p[0] as f64, p[1] as f64, p[2] as f64);
            self.vertices.extend_from_slice(&[r.x as f32, r.y as f32, r.z as f32]);
        }
        for n in solid.normals.chunks_exact(3) {
            let r = rotation * Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64);
            self.normals.extend_from_slice(&[r.x as f32, r.y as f32, r.z as f32]);
        }
        self.uvs.extend_from_slice(&solid.uvs);
        self.indices
            .extend(solid.indices.iter().map(|&idx| idx + vertex_offset));

        self.has_data = !self.indices.is_empty();
    }
}

/// Rotation taking the authoring frame to the scene frame: -90 degrees about
/// X, so `(x, y, z)` becomes `(x, z, -y)`.
pub fn authoring_to_scene() -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}

/// Mesh every exterior ring of a zone into one geometry.
///
/// Interior rings (holes) are dropped. Rings that cannot be extruded are
/// skipped with a warning; if all are skipped the geometry has no data.
pub fn build_zone_mesh(
    shape: &ZoneShape,
    projector: &CoordinateProjector,
    height: f64,
) -> BufferGeometry {
    let rotation = authoring_to_scene();
    let mut geometry = BufferGeometry::default();

    for (piece, ring) in shape.exterior_rings().into_iter().enumerate() {
        let outline = project_ring(ring, projector);
        match extrude_outline(&outline, height) {
            Some(solid) => geometry.append_rotated(solid, &rotation),
            None => {
                console_warn!(
                    "Skipping degenerate ring {} ({} vertices)",
                    piece,
                    ring.0.len()
                );
            }
        }
    }

    geometry
}

fn project_ring(ring: &Ring, projector: &CoordinateProjector) -> Vec<[f64; 2]> {
    // Rings are authored as (lon, lat)
    ring.coords()
        .map(|c| {
            let (x, y) = projector.project(c.y, c.x);
            [x, y]
        })
        .collect()
}
