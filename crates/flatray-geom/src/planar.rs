//! Flat world-space primitives: planes, polygons, rectangles and boxes.

use flatray_math::{Aabb, Frame, Point3, Vec3};

use crate::error::{GeomError, Result};

/// Relative tolerance for polygon coplanarity.
const PLANARITY_TOLERANCE: f32 = 1e-4;

// =============================================================================
// Plane
// =============================================================================

/// An infinite plane through `point` with unit `normal`.
///
/// Texture coordinates are the hit point's coordinates in the plane's tangent
/// frame, relative to `point`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3,
    /// Unit normal.
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane. The normal does not need to be normalized.
    pub fn new(point: Point3, normal: Vec3) -> Result<Self> {
        let len = normal.norm();
        if !(len > 0.0) || !len.is_finite() {
            return Err(GeomError::Degenerate("plane normal"));
        }
        Ok(Self {
            point,
            normal: normal / len,
        })
    }

    /// The plane's tangent frame.
    pub fn frame(&self) -> Frame {
        Frame::from_normal(&self.normal)
    }

    /// Planes are unbounded; this is the largest finite box.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Point3::new(f32::MIN, f32::MIN, f32::MIN),
            Point3::new(f32::MAX, f32::MAX, f32::MAX),
        )
    }

    /// Planes have infinite area.
    pub fn area(&self) -> f32 {
        f32::INFINITY
    }
}

// =============================================================================
// Polygon
// =============================================================================

/// A simple planar polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices in order; the polygon closes implicitly.
    pub vertices: Vec<Point3>,
    /// Unit normal (Newell's method, right-handed with the vertex order).
    pub normal: Vec3,
}

impl Polygon {
    /// Create a polygon from at least three coplanar vertices.
    pub fn new(vertices: Vec<Point3>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(GeomError::TooFewVertices(vertices.len()));
        }
        let newell = newell_normal(&vertices);
        let len = newell.norm();
        if !(len > 0.0) {
            return Err(GeomError::Degenerate("polygon"));
        }
        let normal = newell / len;

        let bounds = Aabb::from_points(vertices.iter());
        let tolerance = PLANARITY_TOLERANCE * bounds.extent().norm().max(1.0);
        let d = normal.dot(&vertices[0].coords);
        for (index, v) in vertices.iter().enumerate() {
            let distance = (normal.dot(&v.coords) - d).abs();
            if distance > tolerance {
                return Err(GeomError::NonPlanar { index, distance });
            }
        }
        Ok(Self { vertices, normal })
    }

    /// Plane offset `d` in `normal · p = d`.
    pub fn plane_offset(&self) -> f32 {
        self.normal.dot(&self.vertices[0].coords)
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }

    /// Polygon area.
    pub fn area(&self) -> f32 {
        0.5 * newell_normal(&self.vertices).norm()
    }
}

fn newell_normal(vertices: &[Point3]) -> Vec3 {
    let mut n = Vec3::zeros();
    for (i, a) in vertices.iter().enumerate() {
        let b = &vertices[(i + 1) % vertices.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// Index of the axis with the largest absolute normal component.
///
/// Projecting along this axis never collapses the polygon.
pub fn dominant_axis(normal: &Vec3) -> usize {
    let a = normal.abs();
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    }
}

// =============================================================================
// Rectangle
// =============================================================================

/// A parallelogram spanned by `side_u` and `side_v` from `corner`.
///
/// Texture coordinates are the hit's fractions along the two sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Corner at uv `(0, 0)`.
    pub corner: Point3,
    /// Side towards uv `(1, 0)`.
    pub side_u: Vec3,
    /// Side towards uv `(0, 1)`.
    pub side_v: Vec3,
}

impl Rectangle {
    /// Create a rectangle from a corner and two non-parallel sides.
    pub fn new(corner: Point3, side_u: Vec3, side_v: Vec3) -> Result<Self> {
        if !(side_u.cross(&side_v).norm_squared() > 0.0) {
            return Err(GeomError::Degenerate("rectangle"));
        }
        Ok(Self {
            corner,
            side_u,
            side_v,
        })
    }

    /// Unit normal `side_u × side_v`.
    pub fn normal(&self) -> Vec3 {
        self.side_u.cross(&self.side_v).normalize()
    }

    /// Corners in winding order.
    pub fn vertices(&self) -> [Point3; 4] {
        let c = self.corner;
        [
            c,
            c + self.side_u,
            c + self.side_u + self.side_v,
            c + self.side_v,
        ]
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices().iter())
    }

    /// Area.
    pub fn area(&self) -> f32 {
        self.side_u.cross(&self.side_v).norm()
    }
}

// =============================================================================
// Rectangular cuboid
// =============================================================================

/// A solid axis-aligned box; rays hit its boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangularCuboid {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl RectangularCuboid {
    /// Create a box; corners are reordered per axis.
    pub fn new(a: Point3, b: Point3) -> Result<Self> {
        let min = a.inf(&b);
        let max = a.sup(&b);
        let finite = |p: &Point3| p.coords.iter().all(|v| v.is_finite());
        if !(finite(&min) && finite(&max)) {
            return Err(GeomError::Degenerate("rectangular cuboid"));
        }
        Ok(Self { min, max })
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }

    /// Total face area.
    pub fn area(&self) -> f32 {
        self.bounds().surface_area()
    }
}
