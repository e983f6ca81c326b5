//! Ray-paraboloid intersection (quadratic equation).

use flatray_geom::{Paraboloid, SurfaceInteraction};
use flatray_math::{azimuth, Point2, Vec3};

use super::{nearest_quadratic_root, phi_in_range, world_frame};
use crate::Ray;

/// Intersect a ray with a clipped paraboloid `z = k·(x² + y²)`.
pub fn intersection_t(ray: &Ray, para: &Paraboloid, t_min: f32, t_max: f32) -> Option<f32> {
    let local = ray.to_object(&para.object_to_world);
    let o = local.origin;
    let d = local.direction;
    let k = para.k();

    let a = k * (d.x * d.x + d.y * d.y);
    let b = 2.0 * k * (d.x * o.x + d.y * o.y) - d.z;
    let c = k * (o.x * o.x + o.y * o.y) - o.z;

    nearest_quadratic_root(a, b, c, t_min, t_max, |t| {
        let p = local.at(t);
        p.z >= para.z_min && p.z <= para.z_max && phi_in_range(p.x, p.y, para.phi_max)
    })
}

/// Surface record for a paraboloid hit at `t`.
pub fn compute_intersection(ray: &Ray, para: &Paraboloid, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&para.object_to_world);
    let p = local.at(t);
    let k = para.k();
    let phi = azimuth(p.x, p.y);
    let v = (p.z - para.z_min) / (para.z_max - para.z_min);
    let uv = Point2::new(phi / para.phi_max, v);

    let gradient = Vec3::new(2.0 * k * p.x, 2.0 * k * p.y, -1.0);
    let dpdu = Vec3::new(-para.phi_max * p.y, para.phi_max * p.x, 0.0);
    let frame = world_frame(&para.object_to_world, &gradient, &dpdu);
    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flatray_math::{Point3, Transform};
    use std::f32::consts::TAU;

    fn bowl() -> Paraboloid {
        // z = x² + y² up to z = 1.
        Paraboloid::new(Transform::identity(), 1.0, 0.0, 1.0, TAU).unwrap()
    }

    #[test]
    fn test_vertical_ray_hits_bowl() {
        let ray = Ray::new(Point3::new(0.5, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = intersection_t(&ray, &bowl(), 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 4.75, epsilon = 1e-5);
        let si = compute_intersection(&ray, &bowl(), t);
        assert_relative_eq!(si.uv.y, 0.25, epsilon = 1e-5);
        assert_relative_eq!(
            si.geometric.n,
            Vec3::new(1.0, 0.0, -1.0).normalize(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_vertex_hit() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = intersection_t(&ray, &bowl(), 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rim_clip() {
        let ray = Ray::new(Point3::new(1.5, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &bowl(), 0.0, f32::INFINITY).is_none());
    }
}
