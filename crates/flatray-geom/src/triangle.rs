//! World-space triangles with per-vertex shading frames.

use flatray_math::{Aabb, Frame, Point2, Point3, Vec3, DET_EPSILON};

/// Texture coordinates used when a mesh supplies none.
pub const DEFAULT_UVS: [Point2; 3] = [
    Point2::new(0.0, 0.0),
    Point2::new(1.0, 0.0),
    Point2::new(1.0, 1.0),
];

/// A triangle with per-vertex normals, tangents and texture coordinates.
///
/// The geometric normal is `normalize((p1 - p0) × (p2 - p0))` and is never
/// flipped towards the incoming ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex positions.
    pub positions: [Point3; 3],
    /// Per-vertex shading normals.
    pub normals: [Vec3; 3],
    /// Per-vertex shading tangents.
    pub tangents: [Vec3; 3],
    /// Per-vertex texture coordinates.
    pub uvs: [Point2; 3],
}

impl Triangle {
    /// Flat-shaded triangle with default texture coordinates.
    ///
    /// Degenerate triangles are accepted; they never report a hit.
    pub fn new(p0: Point3, p1: Point3, p2: Point3) -> Self {
        let positions = [p0, p1, p2];
        let cross = (p1 - p0).cross(&(p2 - p0));
        let (normal, tangent) = if cross.norm_squared() > 0.0 {
            let frame = Frame::from_normal_tangent(&cross, &(p1 - p0));
            (frame.n, frame.s)
        } else {
            (Vec3::z(), Vec3::x())
        };
        Self {
            positions,
            normals: [normal; 3],
            tangents: [tangent; 3],
            uvs: DEFAULT_UVS,
        }
    }

    /// Replace the shading normals and texture coordinates.
    ///
    /// Tangents are re-derived from the texture parameterization when it is
    /// well-formed, otherwise from the first edge.
    pub fn with_shading(mut self, normals: [Vec3; 3], uvs: [Point2; 3]) -> Self {
        let [p0, p1, _] = self.positions;
        let tangent = self.uv_tangent(&uvs).unwrap_or(p1 - p0);
        for i in 0..3 {
            let frame = Frame::from_normal_tangent(&normals[i], &tangent);
            self.normals[i] = frame.n;
            self.tangents[i] = frame.s;
        }
        self.uvs = uvs;
        self
    }

    /// dP/du from the texture parameterization, if the uv triangle is not
    /// degenerate.
    fn uv_tangent(&self, uvs: &[Point2; 3]) -> Option<Vec3> {
        let [p0, p1, p2] = self.positions;
        let du1 = uvs[1] - uvs[0];
        let du2 = uvs[2] - uvs[0];
        let det = du1.x * du2.y - du1.y * du2.x;
        if det.abs() < 1e-12 {
            return None;
        }
        let dpdu = ((p1 - p0) * du2.y - (p2 - p0) * du1.y) / det;
        (dpdu.norm_squared() > 0.0).then_some(dpdu)
    }

    /// Un-normalized `(p1 - p0) × (p2 - p0)`.
    pub fn edge_cross(&self) -> Vec3 {
        let [p0, p1, p2] = self.positions;
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Unit geometric normal, or `None` for a degenerate triangle.
    pub fn geometric_normal(&self) -> Option<Vec3> {
        let c = self.edge_cross();
        let len = c.norm();
        (len > 0.0 && len.is_finite()).then(|| c / len)
    }

    /// True if the triangle has (numerically) zero area.
    ///
    /// The edge cross product is measured against `|e1|·|e2|`, so vertices
    /// that are collinear up to rounding count as degenerate too.
    pub fn is_degenerate(&self) -> bool {
        let [p0, p1, p2] = self.positions;
        let (e1, e2) = (p1 - p0, p2 - p0);
        !(e1.cross(&e2).norm() > DET_EPSILON * e1.norm() * e2.norm())
    }

    /// Triangle area.
    pub fn area(&self) -> f32 {
        0.5 * self.edge_cross().norm()
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter())
    }

    /// Point at barycentric coordinates `(b1, b2)` (weight of `p1`, `p2`).
    pub fn point_at(&self, b1: f32, b2: f32) -> Point3 {
        let [p0, p1, p2] = self.positions;
        let b0 = 1.0 - b1 - b2;
        Point3::from(p0.coords * b0 + p1.coords * b1 + p2.coords * b2)
    }
}
