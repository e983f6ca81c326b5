//! Ray-box intersection by the slab method.

use flatray_geom::{RectangularCuboid, SurfaceInteraction};
use flatray_math::{Frame, Point2, Vec3};

use super::in_window;
use crate::Ray;

/// Intersect a ray with the boundary of an axis-aligned box.
///
/// Uses the ray's precomputed reciprocal direction. Returns the entry
/// point if it lies in the window, otherwise the exit point (rays starting
/// inside the box hit its far wall).
pub fn intersection_t(
    ray: &Ray,
    cuboid: &RectangularCuboid,
    t_min: f32,
    t_max: f32,
) -> Option<f32> {
    let inv = ray.inv_direction();
    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;
    for axis in 0..3 {
        let t0 = (cuboid.min[axis] - ray.origin[axis]) * inv[axis];
        let t1 = (cuboid.max[axis] - ray.origin[axis]) * inv[axis];
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        near = near.max(lo);
        far = far.min(hi);
    }
    if near > far {
        return None;
    }
    if in_window(near, t_min, t_max) {
        Some(near)
    } else if in_window(far, t_min, t_max) {
        Some(far)
    } else {
        None
    }
}

/// Surface record for a box hit at `t`.
///
/// The face is the one whose plane lies closest to the hit point. UVs are
/// the hit's fractional position across that face.
pub fn compute_intersection(ray: &Ray, cuboid: &RectangularCuboid, t: f32) -> SurfaceInteraction {
    let point = ray.at(t);
    let extent = cuboid.max - cuboid.min;

    let mut axis = 0;
    let mut sign = -1.0;
    let mut best = f32::INFINITY;
    for a in 0..3 {
        for (s, plane) in [(-1.0, cuboid.min[a]), (1.0, cuboid.max[a])] {
            let d = (point[a] - plane).abs();
            if d < best {
                best = d;
                axis = a;
                sign = s;
            }
        }
    }

    let (ua, va) = ((axis + 1) % 3, (axis + 2) % 3);
    let frac = |a: usize| {
        if extent[a] > 0.0 {
            (point[a] - cuboid.min[a]) / extent[a]
        } else {
            0.0
        }
    };
    let uv = Point2::new(frac(ua), frac(va));

    let mut normal = Vec3::zeros();
    normal[axis] = sign;
    let mut tangent = Vec3::zeros();
    tangent[ua] = 1.0;
    let frame = Frame::from_normal_tangent(&normal, &tangent);
    SurfaceInteraction::new(t, point, frame, uv)
}
