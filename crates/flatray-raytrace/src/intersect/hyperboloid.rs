//! Ray-hyperboloid intersection (quadratic equation).

use flatray_geom::{Hyperboloid, SurfaceInteraction};
use flatray_math::{azimuth, Point2, Vec3};

use super::{nearest_quadratic_root, phi_in_range, world_frame};
use crate::Ray;

/// Intersect a ray with a hyperboloid of one sheet,
/// `a_h·(x² + y²) − c_h·z² = 1`.
pub fn intersection_t(ray: &Ray, hyp: &Hyperboloid, t_min: f32, t_max: f32) -> Option<f32> {
    let local = ray.to_object(&hyp.object_to_world);
    let o = local.origin;
    let d = local.direction;

    let a = hyp.a_h * (d.x * d.x + d.y * d.y) - hyp.c_h * d.z * d.z;
    let b = 2.0 * (hyp.a_h * (d.x * o.x + d.y * o.y) - hyp.c_h * d.z * o.z);
    let c = hyp.a_h * (o.x * o.x + o.y * o.y) - hyp.c_h * o.z * o.z - 1.0;

    nearest_quadratic_root(a, b, c, t_min, t_max, |t| {
        let p = local.at(t);
        p.z >= hyp.z_min && p.z <= hyp.z_max && phi_in_range(p.x, p.y, hyp.phi_max)
    })
}

/// Surface record for a hyperboloid hit at `t`.
pub fn compute_intersection(ray: &Ray, hyp: &Hyperboloid, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&hyp.object_to_world);
    let p = local.at(t);
    let phi = azimuth(p.x, p.y);
    let height = hyp.z_max - hyp.z_min;
    let v = if height > 0.0 {
        (p.z - hyp.z_min) / height
    } else {
        0.0
    };
    let uv = Point2::new(phi / hyp.phi_max, v);

    let gradient = Vec3::new(hyp.a_h * p.x, hyp.a_h * p.y, -hyp.c_h * p.z);
    let dpdu = Vec3::new(-hyp.phi_max * p.y, hyp.phi_max * p.x, 0.0);
    let frame = world_frame(&hyp.object_to_world, &gradient, &dpdu);
    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}
