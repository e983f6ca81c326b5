//! Ray-plane intersection (closed-form).

use flatray_geom::{Plane, SurfaceInteraction};
use flatray_math::{Point2, PARALLEL_EPSILON};

use super::in_window;
use crate::Ray;

/// Intersect a ray with a plane.
///
/// Returns `None` if the ray is parallel to the plane (within
/// [`PARALLEL_EPSILON`]) or crosses it outside the window.
pub fn intersection_t(ray: &Ray, plane: &Plane, t_min: f32, t_max: f32) -> Option<f32> {
    let denom = ray.direction.dot(&plane.normal);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (plane.point - ray.origin).dot(&plane.normal) / denom;
    in_window(t, t_min, t_max).then_some(t)
}

/// Surface record for a plane hit at `t`.
///
/// UV coordinates are the hit's offset from the plane's reference point in
/// the plane's tangent frame.
pub fn compute_intersection(ray: &Ray, plane: &Plane, t: f32) -> SurfaceInteraction {
    let point = ray.at(t);
    let frame = plane.frame();
    let rel = point - plane.point;
    let uv = Point2::new(rel.dot(&frame.s), rel.dot(&frame.t));
    SurfaceInteraction::new(t, point, frame, uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flatray_math::{Point3, Vec3};

    fn xy() -> Plane {
        Plane::new(Point3::origin(), Vec3::z()).unwrap()
    }

    #[test]
    fn test_ray_plane_perpendicular() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = intersection_t(&ray, &xy(), 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 5.0);
        let si = compute_intersection(&ray, &xy(), t);
        assert_relative_eq!(si.point, Point3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(si.geometric.n, Vec3::z());
        assert_relative_eq!(
            si.uv.coords.norm(),
            Vec3::new(1.0, 2.0, 0.0).norm(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_ray_plane_behind() {
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &xy(), 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_ray_plane_parallel() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersection_t(&ray, &xy(), 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_ray_plane_angled_unnormalized() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Vec3::z()).unwrap();
        let ray = Ray::new(Point3::origin(), Vec3::new(1.0, 0.0, 4.0));
        let t = intersection_t(&ray, &plane, 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 0.5);
        assert_relative_eq!(ray.at(t), Point3::new(0.5, 0.0, 2.0));
    }

    #[test]
    fn test_window_excludes_endpoints() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(intersection_t(&ray, &xy(), 0.0, 5.0).is_none());
        assert!(intersection_t(&ray, &xy(), 5.0, 10.0).is_none());
    }
}
