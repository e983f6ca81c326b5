//! Ray-triangle intersection (Möller–Trumbore).

use flatray_geom::{SurfaceInteraction, Triangle};
use flatray_math::{Frame, Point2, Vec3, DET_EPSILON};

use super::in_window;
use crate::Ray;

/// A triangle hit with its barycentric coordinates.
///
/// `b1` and `b2` weight the second and third vertex; the first vertex gets
/// `1 - b1 - b2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Ray parameter.
    pub t: f32,
    /// Weight of `positions[1]`.
    pub b1: f32,
    /// Weight of `positions[2]`.
    pub b2: f32,
}

impl TriangleHit {
    /// Weight of `positions[0]`.
    pub fn b0(&self) -> f32 {
        1.0 - self.b1 - self.b2
    }
}

/// Intersect a ray with a triangle.
///
/// The determinant is compared against [`DET_EPSILON`] relative to the edge
/// and direction lengths, so degenerate triangles and rays within about
/// `1e-5` radians of edge-on never hit. Both faces are hit.
pub fn intersection_t(ray: &Ray, tri: &Triangle, t_min: f32, t_max: f32) -> Option<TriangleHit> {
    let [p0, p1, p2] = tri.positions;
    let e1 = p1 - p0;
    let e2 = p2 - p0;

    let pvec = ray.direction.cross(&e2);
    let det = e1.dot(&pvec);
    let scale = e1.norm() * e2.norm() * ray.direction.norm();
    if !(det.abs() > DET_EPSILON * scale) {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin - p0;
    let b1 = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&b1) {
        return None;
    }

    let qvec = tvec.cross(&e1);
    let b2 = ray.direction.dot(&qvec) * inv_det;
    if b2 < 0.0 || b1 + b2 > 1.0 {
        return None;
    }

    let t = e2.dot(&qvec) * inv_det;
    in_window(t, t_min, t_max).then_some(TriangleHit { t, b1, b2 })
}

/// Surface record for a triangle hit.
///
/// The geometric frame comes from the winding normal and the first edge;
/// the shading frame blends the per-vertex normals and tangents with the
/// hit's barycentrics. UVs are blended the same way.
pub fn compute_intersection(ray: &Ray, tri: &Triangle, hit: &TriangleHit) -> SurfaceInteraction {
    let [p0, p1, _] = tri.positions;
    let weights = [hit.b0(), hit.b1, hit.b2];
    let blend = |v: &[Vec3; 3]| v[0] * weights[0] + v[1] * weights[1] + v[2] * weights[2];

    let normal = tri.geometric_normal().unwrap_or_else(Vec3::z);
    let geometric = Frame::from_normal_tangent(&normal, &(p1 - p0));
    let shading = Frame::from_normal_tangent(&blend(&tri.normals), &blend(&tri.tangents));

    let [uv0, uv1, uv2] = tri.uvs.map(|uv| uv.coords);
    let uv = Point2::from(uv0 * weights[0] + uv1 * weights[1] + uv2 * weights[2]);

    SurfaceInteraction {
        t: hit.t,
        point: ray.at(hit.t),
        geometric,
        shading,
        uv,
    }
}
