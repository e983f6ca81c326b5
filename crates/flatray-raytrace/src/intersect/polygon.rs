//! Ray-polygon and ray-rectangle intersection: a plane test followed by an
//! even-odd containment test in the dominant-axis projection.

use flatray_geom::{dominant_axis, Rectangle, SurfaceInteraction};
use flatray_math::{Frame, Point2, Point3, Vec3, PARALLEL_EPSILON};

use super::{in_window, point_in_polygon};
use crate::Ray;

/// Intersect a ray with the planar polygon `vertices` (unit `normal`).
///
/// Works directly on a vertex slice so compiled polygons can be tested
/// straight from the shared vertex pool.
pub fn intersection_t(
    ray: &Ray,
    vertices: &[Point3],
    normal: &Vec3,
    t_min: f32,
    t_max: f32,
) -> Option<f32> {
    if vertices.len() < 3 {
        return None;
    }
    let denom = ray.direction.dot(normal);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (vertices[0] - ray.origin).dot(normal) / denom;
    if !in_window(t, t_min, t_max) {
        return None;
    }
    let p = ray.at(t);
    point_in_polygon(vertices, dominant_axis(normal), &p).then_some(t)
}

/// Surface record for a polygon hit at `t`.
///
/// UV coordinates are the hit's offset from the first vertex in a frame
/// whose first tangent follows the first edge.
pub fn compute_intersection(
    ray: &Ray,
    vertices: &[Point3],
    normal: &Vec3,
    t: f32,
) -> SurfaceInteraction {
    let point = ray.at(t);
    let frame = Frame::from_normal_tangent(normal, &(vertices[1] - vertices[0]));
    let rel = point - vertices[0];
    let uv = Point2::new(rel.dot(&frame.s), rel.dot(&frame.t));
    SurfaceInteraction::new(t, point, frame, uv)
}

/// Intersect a ray with a rectangle.
pub fn rectangle_intersection_t(
    ray: &Ray,
    rect: &Rectangle,
    t_min: f32,
    t_max: f32,
) -> Option<f32> {
    intersection_t(ray, &rect.vertices(), &rect.normal(), t_min, t_max)
}

/// Surface record for a rectangle hit at `t`.
///
/// `(u, v)` are the hit's fractional coordinates along `side_u` and
/// `side_v`, which need not be orthogonal.
pub fn rectangle_compute_intersection(ray: &Ray, rect: &Rectangle, t: f32) -> SurfaceInteraction {
    let point = ray.at(t);
    let n = rect.side_u.cross(&rect.side_v);
    let rel = point - rect.corner;
    // Dual basis of (side_u, side_v) within the plane.
    let du = rect.side_v.cross(&n);
    let dv = n.cross(&rect.side_u);
    let uv = Point2::new(
        rel.dot(&du) / rect.side_u.dot(&du),
        rel.dot(&dv) / rect.side_v.dot(&dv),
    );
    let frame = Frame::from_normal_tangent(&n, &rect.side_u);
    SurfaceInteraction::new(t, point, frame, uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flatray_geom::Polygon;

    fn arrowhead() -> Polygon {
        // A concave arrowhead in the plane x = 1.
        Polygon::new(vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 4.0, 0.0),
            Point3::new(1.0, 2.0, 1.0),
            Point3::new(1.0, 0.0, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_polygon_hit_and_notch() {
        let poly = arrowhead();
        let hit = Ray::new(Point3::new(5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        let t = intersection_t(&hit, &poly.vertices, &poly.normal, 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 4.0);

        // Inside the bounding triangle but in the concave notch.
        let notch = Ray::new(Point3::new(5.0, 2.0, 2.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(
            intersection_t(&notch, &poly.vertices, &poly.normal, 0.0, f32::INFINITY).is_none()
        );
    }

    #[test]
    fn test_polygon_frame() {
        let poly = arrowhead();
        let ray = Ray::new(Point3::new(5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        let si = compute_intersection(&ray, &poly.vertices, &poly.normal, 4.0);
        assert_relative_eq!(si.geometric.n, poly.normal);
        assert_relative_eq!(si.geometric.s, Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(si.uv.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_rectangle_uv() {
        let rect = Rectangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
        )
        .unwrap();
        let ray = Ray::new(Point3::new(2.5, 1.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let t = rectangle_intersection_t(&ray, &rect, 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 3.0);
        let si = rectangle_compute_intersection(&ray, &rect, t);
        // (2.5, 1) = 0.5·(4, 0) + 0.5·(1, 2)
        assert_relative_eq!(si.uv, Point2::new(0.5, 0.5), epsilon = 1e-6);
        assert_relative_eq!(si.geometric.n, Vec3::z());
    }

    #[test]
    fn test_rectangle_miss_outside_parallelogram() {
        let rect = Rectangle::new(
            Point3::origin(),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
        )
        .unwrap();
        // Inside the bounding box but left of the slanted side.
        let ray = Ray::new(Point3::new(0.2, 1.8, 3.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(rectangle_intersection_t(&ray, &rect, 0.0, f32::INFINITY).is_none());
    }
}
