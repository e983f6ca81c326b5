//! Ray-cylinder intersection (quadratic equation).

use flatray_geom::{Cylinder, SurfaceInteraction};
use flatray_math::{azimuth, Point2, Vec3};

use super::{nearest_quadratic_root, phi_in_range, world_frame};
use crate::Ray;

/// Intersect a ray with a clipped open cylinder.
///
/// Rays parallel to the axis never hit.
pub fn intersection_t(ray: &Ray, cyl: &Cylinder, t_min: f32, t_max: f32) -> Option<f32> {
    let local = ray.to_object(&cyl.object_to_world);
    let o = local.origin;
    let d = local.direction;

    // |P_xy(t)|² = r²
    let a = d.x * d.x + d.y * d.y;
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * (d.x * o.x + d.y * o.y);
    let c = o.x * o.x + o.y * o.y - cyl.radius * cyl.radius;

    nearest_quadratic_root(a, b, c, t_min, t_max, |t| {
        let p = local.at(t);
        p.z >= cyl.z_min && p.z <= cyl.z_max && phi_in_range(p.x, p.y, cyl.phi_max)
    })
}

/// Surface record for a cylinder hit at `t`.
///
/// `u = phi / phi_max`, `v = (z - z_min) / (z_max - z_min)`.
pub fn compute_intersection(ray: &Ray, cyl: &Cylinder, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&cyl.object_to_world);
    let p = local.at(t);
    let phi = azimuth(p.x, p.y);
    let height = cyl.z_max - cyl.z_min;
    let v = if height > 0.0 {
        (p.z - cyl.z_min) / height
    } else {
        0.0
    };
    let uv = Point2::new(phi / cyl.phi_max, v);

    let gradient = Vec3::new(p.x, p.y, 0.0);
    let dpdu = Vec3::new(-cyl.phi_max * p.y, cyl.phi_max * p.x, 0.0);
    let frame = world_frame(&cyl.object_to_world, &gradient, &dpdu);
    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}
