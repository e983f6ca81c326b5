//! Scene description: a list of primitives with their material words.

use flatray_geom::{
    Cone, Curve, Cylinder, Disk, Hyperboloid, PackedRef, Paraboloid, Plane, Polygon, Rectangle,
    RectangularCuboid, ShapeKind, Sphere, Torus, Triangle,
};
use flatray_math::Aabb;

use crate::mesh::TriangleMesh;

/// Any primitive the compiler understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Infinite plane.
    Plane(Plane),
    /// Partial sphere.
    Sphere(Sphere),
    /// Disk or annulus.
    Disk(Disk),
    /// Cone.
    Cone(Cone),
    /// Cylinder.
    Cylinder(Cylinder),
    /// Hyperboloid of one sheet.
    Hyperboloid(Hyperboloid),
    /// Paraboloid.
    Paraboloid(Paraboloid),
    /// Planar polygon.
    Polygon(Polygon),
    /// Parallelogram.
    Rectangle(Rectangle),
    /// Axis-aligned box.
    RectangularCuboid(RectangularCuboid),
    /// Torus.
    Torus(Torus),
    /// Stand-alone triangle.
    Triangle(Triangle),
    /// Cubic Bézier segment.
    Curve(Curve),
    /// Triangle mesh.
    Mesh(TriangleMesh),
}

impl Shape {
    /// The primitive kind.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Plane(_) => ShapeKind::Plane,
            Shape::Sphere(_) => ShapeKind::Sphere,
            Shape::Disk(_) => ShapeKind::Disk,
            Shape::Cone(_) => ShapeKind::Cone,
            Shape::Cylinder(_) => ShapeKind::Cylinder,
            Shape::Hyperboloid(_) => ShapeKind::Hyperboloid,
            Shape::Paraboloid(_) => ShapeKind::Paraboloid,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::RectangularCuboid(_) => ShapeKind::RectangularCuboid,
            Shape::Torus(_) => ShapeKind::Torus,
            Shape::Triangle(_) => ShapeKind::Triangle,
            Shape::Curve(_) => ShapeKind::Curve,
            Shape::Mesh(_) => ShapeKind::Mesh,
        }
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Plane(s) => s.bounds(),
            Shape::Sphere(s) => s.bounds(),
            Shape::Disk(s) => s.bounds(),
            Shape::Cone(s) => s.bounds(),
            Shape::Cylinder(s) => s.bounds(),
            Shape::Hyperboloid(s) => s.bounds(),
            Shape::Paraboloid(s) => s.bounds(),
            Shape::Polygon(s) => s.bounds(),
            Shape::Rectangle(s) => s.bounds(),
            Shape::RectangularCuboid(s) => s.bounds(),
            Shape::Torus(s) => s.bounds(),
            Shape::Triangle(s) => s.bounds(),
            Shape::Curve(s) => s.bounds(),
            Shape::Mesh(s) => s.bounds(),
        }
    }

    /// Surface area.
    pub fn area(&self) -> f32 {
        match self {
            Shape::Plane(s) => s.area(),
            Shape::Sphere(s) => s.area(),
            Shape::Disk(s) => s.area(),
            Shape::Cone(s) => s.area(),
            Shape::Cylinder(s) => s.area(),
            Shape::Hyperboloid(s) => s.area(),
            Shape::Paraboloid(s) => s.area(),
            Shape::Polygon(s) => s.area(),
            Shape::Rectangle(s) => s.area(),
            Shape::RectangularCuboid(s) => s.area(),
            Shape::Torus(s) => s.area(),
            Shape::Triangle(s) => s.area(),
            Shape::Curve(s) => s.area(),
            Shape::Mesh(s) => s.area(),
        }
    }
}

macro_rules! impl_from_shape {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Shape {
                fn from(s: $variant) -> Self {
                    Shape::$variant(s)
                }
            }
        )*
    };
}

impl_from_shape!(
    Plane,
    Sphere,
    Disk,
    Cone,
    Cylinder,
    Hyperboloid,
    Paraboloid,
    Polygon,
    Rectangle,
    RectangularCuboid,
    Torus,
    Triangle,
    Curve,
);

impl From<TriangleMesh> for Shape {
    fn from(mesh: TriangleMesh) -> Self {
        Shape::Mesh(mesh)
    }
}

/// A primitive plus the opaque material word the compiler carries with it.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Geometry.
    pub shape: Shape,
    /// Material or texture reference, never interpreted here.
    pub material: PackedRef,
}

/// An ordered list of scene objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive.
    pub fn add(&mut self, shape: impl Into<Shape>, material: PackedRef) -> &mut Self {
        self.objects.push(SceneObject {
            shape: shape.into(),
            material,
        });
        self
    }

    /// All objects, in insertion order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the scene has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Union of all object bounds.
    pub fn bounds(&self) -> Aabb {
        self.objects
            .iter()
            .fold(Aabb::empty(), |b, o| b.union(&o.shape.bounds()))
    }
}

impl FromIterator<SceneObject> for Scene {
    fn from_iter<I: IntoIterator<Item = SceneObject>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatray_math::{Point3, Vec3};

    #[test]
    fn test_kinds_and_bounds() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0).unwrap();
        let corner = Point3::new(-1.0, -1.0, -1.0);
        let cuboid = RectangularCuboid::new(corner, Point3::new(2.0, 0.0, 0.0)).unwrap();
        let mut scene = Scene::new();
        scene
            .add(sphere, PackedRef::new(1, 0))
            .add(cuboid, PackedRef::new(1, 1));
        assert_eq!(scene.len(), 2);
        let kinds: Vec<ShapeKind> = scene.objects().iter().map(|o| o.shape.kind()).collect();
        assert_eq!(kinds, [ShapeKind::Sphere, ShapeKind::RectangularCuboid]);
        assert_eq!(scene.objects()[1].material, PackedRef::new(1, 1));

        let b = scene.bounds();
        assert!(b.contains_point(&Point3::new(0.0, 0.0, 6.0)));
        assert!(b.contains_point(&Point3::new(-1.0, -1.0, -1.0)));
    }

    #[test]
    fn test_plane_bounds_are_unbounded() {
        let plane = Shape::from(Plane::new(Point3::origin(), Vec3::z()).unwrap());
        assert!(plane.bounds().contains_point(&Point3::new(1e30, -1e30, 0.0)));
        assert_eq!(plane.area(), f32::INFINITY);
    }
}
