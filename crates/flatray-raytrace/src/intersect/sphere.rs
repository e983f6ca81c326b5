//! Ray-sphere intersection (quadratic equation).

use std::f32::consts::PI;

use flatray_geom::{Sphere, SurfaceInteraction};
use flatray_math::{azimuth, Point2, Vec3};

use super::{nearest_quadratic_root, phi_in_range, world_frame};
use crate::Ray;

/// Intersect a ray with a (clipped) sphere.
///
/// Solves against the unit sphere in object space. When the nearer root
/// falls outside the `z` or `phi` clip range the farther root is tried.
pub fn intersection_t(ray: &Ray, sphere: &Sphere, t_min: f32, t_max: f32) -> Option<f32> {
    let local = ray.to_object(&sphere.object_to_world);
    let o = local.origin.coords;
    let d = local.direction;

    let a = d.dot(&d);
    let b = 2.0 * o.dot(&d);
    let c = o.dot(&o) - 1.0;

    nearest_quadratic_root(a, b, c, t_min, t_max, |t| {
        let p = local.at(t);
        p.z >= sphere.z_min && p.z <= sphere.z_max && phi_in_range(p.x, p.y, sphere.phi_max)
    })
}

/// Surface record for a sphere hit at `t`.
///
/// `u = phi / phi_max`, `v = acos(z) / pi`, both in `[0, 1]`.
pub fn compute_intersection(ray: &Ray, sphere: &Sphere, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&sphere.object_to_world);
    let mut p = local.at(t);
    // Reproject onto the surface to remove drift.
    let len = p.coords.norm();
    if len > 0.0 {
        p.coords /= len;
    }

    let phi = azimuth(p.x, p.y);
    let uv = Point2::new(phi / sphere.phi_max, p.z.clamp(-1.0, 1.0).acos() / PI);
    let dpdu = Vec3::new(-sphere.phi_max * p.y, sphere.phi_max * p.x, 0.0);
    let frame = world_frame(&sphere.object_to_world, &p.coords, &dpdu);

    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}
