//! Ray-curve intersection by recursive Bézier subdivision.
//!
//! The control points are moved into a ray-aligned frame (ray along +z,
//! origin at zero). The curve is split in half until the depth budget is
//! spent or a half's widened hull misses the ray, then each remaining piece
//! is treated as a straight thick segment and tested in 2D.

use flatray_geom::{eval_bezier, subdivide_bezier, Curve, CurveKind, SurfaceInteraction};
use flatray_math::{Frame, Point2, Point3, Transform, Vec3};

use super::in_window;
use crate::Ray;

const MAX_DEPTH: i32 = 10;

/// A curve hit with the segment-local curve parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveHit {
    /// Ray parameter.
    pub t: f32,
    /// Local parameter along the segment, in `[0, 1]`.
    pub u: f32,
    /// Position across the width, 0 on one edge and 1 on the other.
    pub v: f32,
}

/// Orthonormal frame with `n` along the ray and `s` across the curve chord.
fn ray_frame(ray: &Ray, curve: &Curve) -> Frame {
    let chord = curve.control_points[3] - curve.control_points[0];
    let across = ray.direction.cross(&chord);
    Frame::from_normal_tangent(&ray.direction, &across)
}

/// Subdivision depth from the control polygon's flatness relative to the
/// curve width.
fn refinement_depth(cp: &[Point3; 4], max_width: f32) -> i32 {
    let mut l0 = 0.0f32;
    for i in 0..2 {
        let dd = cp[i].coords - cp[i + 1].coords * 2.0 + cp[i + 2].coords;
        l0 = l0.max(dd.x.abs()).max(dd.y.abs()).max(dd.z.abs());
    }
    let eps = 0.05 * max_width;
    if !(eps > 0.0) || !(l0 > 0.0) {
        return 0;
    }
    // log4 of the flatness ratio.
    let r0 = ((std::f32::consts::SQRT_2 * 6.0 * l0 / (8.0 * eps)).log2() * 0.5).round();
    (r0 as i32).clamp(0, MAX_DEPTH)
}

/// Axis-aligned hull of `cp` in ray space, widened by half the width.
fn hull_overlaps(cp: &[Point3], half_width: f32, z_min: f32, z_max: f32) -> bool {
    let (mut lo, mut hi) = (cp[0], cp[0]);
    for p in &cp[1..] {
        lo = lo.inf(p);
        hi = hi.sup(p);
    }
    hi.x + half_width >= 0.0
        && lo.x - half_width <= 0.0
        && hi.y + half_width >= 0.0
        && lo.y - half_width <= 0.0
        && hi.z + half_width >= z_min
        && lo.z - half_width <= z_max
}

/// Spherical interpolation between the ribbon end normals.
fn ribbon_normal(curve: &Curve, u: f32) -> Vec3 {
    let [n0, n1] = curve.normals;
    let cos = n0.dot(&n1).clamp(-1.0, 1.0);
    let angle = cos.acos();
    if angle < 1e-4 {
        return n0.lerp(&n1, u).normalize();
    }
    let inv_sin = 1.0 / angle.sin();
    n0 * (((1.0 - u) * angle).sin() * inv_sin) + n1 * ((u * angle).sin() * inv_sin)
}

/// Width seen by the ray at local parameter `u`.
///
/// Ribbons foreshorten with the angle between their normal and the ray.
fn hit_width(curve: &Curve, direction: &Vec3, u: f32) -> f32 {
    let w = curve.width_at(u);
    match curve.kind {
        CurveKind::Ribbon => w * ribbon_normal(curve, u).dot(direction).abs() / direction.norm(),
        CurveKind::Flat | CurveKind::Cylinder => w,
    }
}

struct Search<'a> {
    curve: &'a Curve,
    direction: Vec3,
    ray_length: f32,
    t_min: f32,
    best: Option<CurveHit>,
    t_max: f32,
}

impl Search<'_> {
    fn recurse(&mut self, cp: &[Point3; 4], u0: f32, u1: f32, depth: i32) {
        if depth > 0 {
            let split = subdivide_bezier(cp);
            let us = [u0, 0.5 * (u0 + u1), u1];
            for seg in 0..2 {
                let half = [0, 1, 2, 3].map(|k| split[3 * seg + k]);
                let w = self.curve.width_at(us[seg]);
                let max_width = w.max(self.curve.width_at(us[seg + 1]));
                let z_min = self.ray_length * self.t_min;
                let z_max = self.ray_length * self.t_max;
                if !hull_overlaps(&half, 0.5 * max_width, z_min, z_max) {
                    continue;
                }
                self.recurse(&half, us[seg], us[seg + 1], depth - 1);
            }
            return;
        }
        self.test_segment(cp, u0, u1);
    }

    fn test_segment(&mut self, cp: &[Point3; 4], u0: f32, u1: f32) {
        // The ray must lie between the perpendiculars at both ends.
        let edge = (cp[1].y - cp[0].y) * -cp[0].y + cp[0].x * (cp[0].x - cp[1].x);
        if edge < 0.0 {
            return;
        }
        let edge = (cp[2].y - cp[3].y) * -cp[3].y + cp[3].x * (cp[3].x - cp[2].x);
        if edge < 0.0 {
            return;
        }

        // Closest point on the chord to the ray (the 2D origin).
        let seg = Point2::new(cp[3].x - cp[0].x, cp[3].y - cp[0].y);
        let denom = seg.coords.norm_squared();
        if denom == 0.0 {
            return;
        }
        let w = -(cp[0].x * seg.x + cp[0].y * seg.y) / denom;
        let u = (u0 + (u1 - u0) * w).clamp(u0, u1);

        let width = hit_width(self.curve, &self.direction, u);
        let (pc, dpcdw) = eval_bezier(cp, w.clamp(0.0, 1.0));
        let dist2 = pc.x * pc.x + pc.y * pc.y;
        if dist2 > width * width * 0.25 {
            return;
        }

        let t = pc.z / self.ray_length;
        if !in_window(t, self.t_min, self.t_max) {
            return;
        }

        let dist = dist2.sqrt();
        let edge_func = dpcdw.x * -pc.y + pc.x * dpcdw.y;
        let v = if edge_func > 0.0 {
            0.5 + dist / width
        } else {
            0.5 - dist / width
        };

        self.t_max = t;
        self.best = Some(CurveHit { t, u, v });
    }
}

/// Intersect a ray with a curve segment.
pub fn intersection_t(ray: &Ray, curve: &Curve, t_min: f32, t_max: f32) -> Option<CurveHit> {
    let ray_length = ray.direction.norm();
    if !(ray_length > 0.0) {
        return None;
    }
    let frame = ray_frame(ray, curve);
    let cp = curve
        .control_points
        .map(|p| Point3::from(frame.to_local(&(p - ray.origin))));

    let max_width = curve.widths[0].max(curve.widths[1]);
    if !hull_overlaps(&cp, 0.5 * max_width, ray_length * t_min, ray_length * t_max) {
        return None;
    }

    let mut search = Search {
        curve,
        direction: ray.direction,
        ray_length,
        t_min,
        best: None,
        t_max,
    };
    search.recurse(&cp, 0.0, 1.0, refinement_depth(&cp, max_width));
    search.best
}

/// Surface record for a curve hit.
///
/// The returned `u` is the strand parameter; `v` runs across the width.
/// Cylinder curves tilt their normal across the width so they shade like a
/// round tube.
pub fn compute_intersection(ray: &Ray, curve: &Curve, hit: &CurveHit) -> SurfaceInteraction {
    let dpdu = curve.derivative(hit.u);
    let width = hit_width(curve, &ray.direction, hit.u);

    let dpdv = match curve.kind {
        CurveKind::Ribbon => ribbon_normal(curve, hit.u).cross(&dpdu).normalize() * width,
        CurveKind::Flat | CurveKind::Cylinder => {
            let frame = ray_frame(ray, curve);
            let dpdu_plane = frame.to_local(&dpdu);
            let mut dpdv_plane = Vec3::new(-dpdu_plane.y, dpdu_plane.x, 0.0).normalize() * width;
            if curve.kind == CurveKind::Cylinder {
                let theta = (-90.0 + 180.0 * hit.v).to_radians();
                let rotate = Transform::rotation_about_axis(&dpdu_plane, -theta);
                dpdv_plane = rotate.apply_vec(&dpdv_plane);
            }
            frame.to_world(&dpdv_plane)
        }
    };

    let normal = dpdu.cross(&dpdv);
    let geometric = Frame::from_normal_tangent(&normal, &dpdu);
    let uv = Point2::new(curve.strand_u(hit.u), hit.v);
    SurfaceInteraction::new(hit.t, ray.at(hit.t), geometric, uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight(kind: CurveKind) -> Curve {
        Curve::new(
            [
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(-1.0 / 3.0, 0.0, 0.0),
                Point3::new(1.0 / 3.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            [0.2, 0.2],
            kind,
        )
        .unwrap()
    }

    #[test]
    fn test_straight_curve_center_hit() {
        let curve = straight(CurveKind::Flat);
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = intersection_t(&ray, &curve, 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(hit.t, 5.0, epsilon = 1e-5);
        assert_relative_eq!(hit.u, 0.5, epsilon = 1e-5);
        assert_relative_eq!(hit.v, 0.5, epsilon = 1e-5);

        let si = compute_intersection(&ray, &curve, &hit);
        // A flat curve faces the ray.
        assert_relative_eq!(si.geometric.n.z.abs(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(si.geometric.s, Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_miss_beyond_half_width() {
        let curve = straight(CurveKind::Flat);
        let ray = Ray::new(Point3::new(0.0, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &curve, 0.0, f32::INFINITY).is_none());
        let ray = Ray::new(Point3::new(0.0, 0.05, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &curve, 0.0, f32::INFINITY).is_some());
    }

    #[test]
    fn test_miss_past_end() {
        let curve = straight(CurveKind::Flat);
        let ray = Ray::new(Point3::new(1.5, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &curve, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_bent_curve_nearest_hit() {
        // An arch that the ray crosses twice; the nearer crossing wins.
        let curve = Curve::new(
            [
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 2.0),
                Point3::new(1.0, 0.0, 2.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            [0.1, 0.1],
            CurveKind::Cylinder,
        )
        .unwrap();
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.75), Vec3::new(1.0, 0.0, 0.0));
        let hit = intersection_t(&ray, &curve, 0.0, f32::INFINITY).unwrap();
        let p = ray.at(hit.t);
        assert!(p.x < 0.0);
        assert_relative_eq!(curve.eval(hit.u).z, 0.75, epsilon = 0.05);
    }

    #[test]
    fn test_ribbon_edge_on_misses() {
        // Ribbon normal perpendicular to the ray: zero projected width.
        let curve = straight(CurveKind::Ribbon)
            .with_normals(Vec3::y(), Vec3::y())
            .unwrap();
        let ray = Ray::new(Point3::new(0.0, 0.01, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &curve, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_strand_u_reported() {
        let pts: Vec<Point3> = (0..7)
            .map(|i| Point3::new(i as f32 / 3.0 - 1.0, 0.0, 0.0))
            .collect();
        let segments = Curve::strand(&pts, [0.2, 0.2], CurveKind::Flat).unwrap();
        let ray = Ray::new(Point3::new(0.5, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = intersection_t(&ray, &segments[1], 0.0, f32::INFINITY).unwrap();
        let si = compute_intersection(&ray, &segments[1], &hit);
        assert_relative_eq!(si.uv.x, 0.75, epsilon = 1e-4);
    }
}
