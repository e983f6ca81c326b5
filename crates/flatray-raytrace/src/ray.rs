//! Ray representation and the ray/box slab test.

use flatray_math::{Aabb, Point3, Transform, Vec3};

/// A ray in 3D space defined by origin and direction.
///
/// The direction is stored as given, without normalization, so the ray
/// parameter `t` means the same thing before and after an affine transform.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Direction of the ray (not necessarily unit length).
    pub direction: Vec3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and direction.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let inv = Vec3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);
        let sign = [
            usize::from(inv.x < 0.0),
            usize::from(inv.y < 0.0),
            usize::from(inv.z < 0.0),
        ];
        Self {
            origin,
            direction,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }

    /// Reciprocal direction components.
    #[inline]
    pub fn inv_direction(&self) -> &Vec3 {
        &self.inv_direction
    }

    /// This ray expressed in the object space of `object_to_world`.
    ///
    /// The direction is not renormalized, so hit parameters carry over.
    pub fn to_object(&self, object_to_world: &Transform) -> Ray {
        Ray::new(
            object_to_world.unapply_point(&self.origin),
            object_to_world.unapply_vec(&self.direction),
        )
    }

    /// Slab test against `aabb`, clipped to the window `[t_min, t_max]`.
    ///
    /// Returns the entry and exit parameters of the overlap, or `None` if the
    /// ray misses the box inside the window. Infinite reciprocals from
    /// axis-aligned rays are handled by the IEEE min/max rules; a `0 * inf`
    /// NaN on a slab boundary is ignored by `f32::max`/`f32::min`.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb, t_min: f32, t_max: f32) -> Option<(f32, f32)> {
        let bounds = [aabb.min, aabb.max];

        let tx1 = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut near = t_min.max(tx1);
        let mut far = t_max.min(tx2);

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        near = near.max(ty1);
        far = far.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        near = near.max(tz1);
        far = far.min(tz2);

        if near <= far {
            Some((near, far))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(ray.at(5.0), Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t0, t1) = ray.intersect_aabb(&unit_box(), 0.0, f32::INFINITY).unwrap();
        assert_relative_eq!(t0, 5.0);
        assert_relative_eq!(t1, 6.0);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box(), 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_ray_inside_aabb() {
        let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t0, t1) = ray.intersect_aabb(&unit_box(), 0.0, f32::INFINITY).unwrap();
        assert_eq!(t0, 0.0);
        assert_relative_eq!(t1, 0.5);
    }

    #[test]
    fn test_ray_aabb_behind() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box(), 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_ray_aabb_window_too_short() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box(), 0.0, 4.0).is_none());
    }

    #[test]
    fn test_object_space_keeps_t() {
        let scale = Transform::scale(2.0, 2.0, 2.0).unwrap();
        let t = Transform::translation(0.0, 0.0, 3.0).then(&scale);
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let local = ray.to_object(&t);
        assert_relative_eq!(t.apply_point(&local.at(2.5)), ray.at(2.5), epsilon = 1e-5);
    }
}
