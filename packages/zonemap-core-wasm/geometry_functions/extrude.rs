use earcutr::earcut;
use geo::Winding;
use geo_types::{Coord, LineString};

use crate::console_warn;

const EPSILON: f64 = 1e-10;

/// Extruded solid in the authoring frame: outline in the XY plane, extrusion
/// along +Z from 0 to `depth`. Vertices are not shared between triangles, so
/// every triangle carries its own flat normal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtrudedSolid {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ExtrudedSolid {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_triangle(&mut self, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        let current_vertex = self.vertex_count() as u32;
        self.indices
            .extend_from_slice(&[current_vertex, current_vertex + 1, current_vertex + 2]);

        let normal = face_normal(a, b, c);
        for vertex in [a, b, c] {
            self.positions.push(vertex[0] as f32);
            self.positions.push(vertex[1] as f32);
            self.positions.push(vertex[2] as f32);
            self.normals.extend_from_slice(&normal);
        }
    }

    // Caps map planar coordinates straight to uv, like a world uv generator
    fn push_cap_uvs(&mut self, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        for vertex in [a, b, c] {
            self.uvs.push(vertex[0] as f32);
            self.uvs.push(vertex[1] as f32);
        }
    }

    fn push_side_uvs(&mut self, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        // Walls use the dominant horizontal axis for u and height for v
        let use_x = (a[1] - b[1]).abs() < (a[0] - b[0]).abs();
        for vertex in [a, b, c] {
            let u = if use_x { vertex[0] } else { vertex[1] };
            self.uvs.push(u as f32);
            self.uvs.push(vertex[2] as f32);
        }
    }
}

/// Extrude one outline by `depth` with flat caps and walls (no bevel).
///
/// The outline may be closed (last vertex repeating the first) and in any
/// winding. Returns `None` when fewer than three distinct vertices remain or
/// the cap cannot be triangulated.
pub fn extrude_outline(outline: &[[f64; 2]], depth: f64) -> Option<ExtrudedSolid> {
    let contour = prepare_contour(outline)?;

    let mut data: Vec<f64> = Vec::with_capacity(contour.len() * 2);
    for pt in &contour {
        data.push(pt.x);
        data.push(pt.y);
    }
    let triangles = match earcut(&data, &[], 2) {
        Ok(indices) => indices,
        Err(e) => {
            console_warn!("Cap triangulation failed: {:?}", e);
            return None;
        }
    };
    if triangles.is_empty() {
        return None;
    }

    let mut solid = ExtrudedSolid::default();
    let bottom = |i: usize| [contour[i].x, contour[i].y, 0.0];
    let top = |i: usize| [contour[i].x, contour[i].y, depth];

    for face in triangles.chunks_exact(3) {
        let (mut i0, i1, mut i2) = (face[0], face[1], face[2]);
        // Orient every cap triangle counter-clockwise seen from +Z
        if signed_area2(contour[i0], contour[i1], contour[i2]) < 0.0 {
            std::mem::swap(&mut i0, &mut i2);
        }

        // Bottom faces look down
        solid.push_triangle(bottom(i2), bottom(i1), bottom(i0));
        solid.push_cap_uvs(bottom(i2), bottom(i1), bottom(i0));

        // Top faces look up
        solid.push_triangle(top(i0), top(i1), top(i2));
        solid.push_cap_uvs(top(i0), top(i1), top(i2));
    }

    // Side walls, one quad per contour edge
    let n = contour.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let a = bottom(i);
        let b = bottom(j);
        let c = top(j);
        let d = top(i);

        solid.push_triangle(a, b, c);
        solid.push_side_uvs(a, b, c);
        solid.push_triangle(a, c, d);
        solid.push_side_uvs(a, c, d);
    }

    Some(solid)
}

/// Close, de-duplicate and orient the outline counter-clockwise. The
/// returned contour does not repeat its first vertex.
fn prepare_contour(outline: &[[f64; 2]]) -> Option<Vec<Coord<f64>>> {
    let mut points: Vec<Coord<f64>> = outline.iter().map(|p| Coord { x: p[0], y: p[1] }).collect();
    merge_overlapping_points(&mut points);

    if points.len() > 1 && same_point(points[0], points[points.len() - 1]) {
        points.pop();
    }
    if points.len() < 3 {
        return None;
    }

    let mut ring = LineString::new(points);
    ring.close();
    ring.make_ccw_winding();

    let mut contour = ring.0;
    contour.pop();
    Some(contour)
}

/// Merge consecutive points that are closer than a scale-aware epsilon.
fn merge_overlapping_points(points: &mut Vec<Coord<f64>>) {
    points.dedup_by(|current, prev| same_point(*prev, *current));
}

fn same_point(a: Coord<f64>, b: Coord<f64>) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let scaling = f64::max(f64::max(a.x.abs(), a.y.abs()), f64::max(b.x.abs(), b.y.abs())).max(1.0);
    dx * dx + dy * dy <= EPSILON * EPSILON * scaling * scaling
}

fn signed_area2(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn face_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f32; 3] {
    let v1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];

    let nx = v1[1] * v2[2] - v1[2] * v2[1];
    let ny = v1[2] * v2[0] - v1[0] * v2[2];
    let nz = v1[0] * v2[1] - v1[1] * v2[0];

    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len > EPSILON {
        [(nx / len) as f32, (ny / len) as f32, (nz / len) as f32]
    } else {
        // Degenerate triangle - Z-up is visually correct for extrusions
        [0.0, 0.0, 1.0]
    }
}
