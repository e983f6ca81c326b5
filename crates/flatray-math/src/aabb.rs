//! Axis-aligned bounding boxes.

use crate::{Point3, Transform, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing all `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// True if nothing has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    pub fn include_aabb(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.include_aabb(other);
        out
    }

    /// Expand the AABB by a distance in all directions.
    pub fn expand(&mut self, d: f32) {
        self.min -= Vec3::repeat(d);
        self.max += Vec3::repeat(d);
    }

    /// Test if a point lies inside or on the box.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Test if `other` lies entirely inside this box.
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        other.is_empty() || (self.contains_point(&other.min) && self.contains_point(&other.max))
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Summed area of the six faces; zero for an empty box.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Conservative world box of this object-space box under `transform`.
    pub fn transformed(&self, transform: &Transform) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let corners = self.corners().map(|c| transform.apply_point(&c));
        Aabb::from_points(corners.iter())
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
