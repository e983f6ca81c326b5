//! Ray-cone intersection (quadratic equation).

use flatray_geom::{Cone, SurfaceInteraction};
use flatray_math::{azimuth, Point2, Vec3};

use super::{nearest_quadratic_root, phi_in_range, world_frame};
use crate::Ray;

/// Intersect a ray with an open cone.
///
/// The implicit surface is `x² + y² = k·(z - h)²` with `k = (r / h)²`,
/// clipped to `z in [0, h]` so only the nappe below the apex counts.
pub fn intersection_t(ray: &Ray, cone: &Cone, t_min: f32, t_max: f32) -> Option<f32> {
    let local = ray.to_object(&cone.object_to_world);
    let o = local.origin;
    let d = local.direction;
    let h = cone.height;
    let k = (cone.radius / h).powi(2);
    let oz = o.z - h;

    let a = d.x * d.x + d.y * d.y - k * d.z * d.z;
    let b = 2.0 * (d.x * o.x + d.y * o.y - k * d.z * oz);
    let c = o.x * o.x + o.y * o.y - k * oz * oz;

    nearest_quadratic_root(a, b, c, t_min, t_max, |t| {
        let p = local.at(t);
        p.z >= 0.0 && p.z <= h && phi_in_range(p.x, p.y, cone.phi_max)
    })
}

/// Surface record for a cone hit at `t`.
///
/// `u = phi / phi_max`, `v = z / height`.
pub fn compute_intersection(ray: &Ray, cone: &Cone, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&cone.object_to_world);
    let p = local.at(t);
    let h = cone.height;
    let k = (cone.radius / h).powi(2);
    let phi = azimuth(p.x, p.y);
    let uv = Point2::new(phi / cone.phi_max, p.z / h);

    let gradient = Vec3::new(p.x, p.y, k * (h - p.z));
    let dpdu = Vec3::new(-cone.phi_max * p.y, cone.phi_max * p.x, 0.0);
    let frame = world_frame(&cone.object_to_world, &gradient, &dpdu);
    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flatray_math::{Point3, Transform};
    use std::f32::consts::TAU;

    fn cone() -> Cone {
        // 45 degree cone, apex at z = 1.
        Cone::new(Transform::identity(), 1.0, 1.0, TAU).unwrap()
    }

    #[test]
    fn test_horizontal_ray_at_half_height() {
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let t = intersection_t(&ray, &cone(), 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 4.5, epsilon = 1e-5);

        let si = compute_intersection(&ray, &cone(), t);
        let expected = Vec3::new(-1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(si.geometric.n, expected, epsilon = 1e-5);
        assert_relative_eq!(si.uv, Point2::new(0.5, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_upper_nappe_is_clipped() {
        // Above the apex the double cone continues; those hits are rejected.
        let ray = Ray::new(Point3::new(-5.0, 0.0, 1.5), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersection_t(&ray, &cone(), 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_vertical_ray_down_the_side() {
        let ray = Ray::new(Point3::new(0.25, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = intersection_t(&ray, &cone(), 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(ray.at(t).z, 0.75, epsilon = 1e-5);
    }

    #[test]
    fn test_miss_outside_base() {
        let ray = Ray::new(Point3::new(2.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &cone(), 0.0, f32::INFINITY).is_none());
    }
}
