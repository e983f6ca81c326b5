//! Flat-array intersection kernel.
//!
//! [`Kernel`] reads a [`FlatScene`] and nothing else. Every query keeps its
//! state (current winner, narrowed `t_max`) on its own stack frame, so one
//! kernel can be shared by any number of threads; [`Kernel::nearest_batch`]
//! does exactly that with rayon.
//!
//! Mesh BVHs are walked without a stack: the walk is a single relative
//! offset that either moves into a node's left child or jumps to its
//! `next` record, and stops at [`END`].

use flatray_geom::{
    Cone, Curve, Cylinder, Disk, Hyperboloid, PackedRef, Paraboloid, Plane, Rectangle,
    RectangularCuboid, ShapeKind, Sphere, SurfaceInteraction, Torus, Triangle,
};
use flatray_math::Point2;
use rayon::prelude::*;

use crate::compile::flatten::{record_words, TAG_LEAF};
use crate::compile::{FlatRecord, FlatScene, MeshRecord, PolygonRecord, END};
use crate::config::KernelOptions;
use crate::intersect::{
    cone, cuboid, curve, cylinder, disk, hyperboloid, paraboloid, plane, polygon, sphere, torus,
    triangle, CurveHit, TriangleHit,
};
use crate::Ray;

/// The winning primitive of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Ray parameter.
    pub t: f32,
    /// Top-level primitive that was hit.
    pub primitive: PackedRef,
    /// For meshes, the hit triangle's index in the shared mesh-triangle
    /// table; 0 otherwise.
    pub element: u32,
    /// Triangle barycentrics `(b1, b2)` or curve `(u, v)`; zero for other
    /// kinds.
    pub param: Point2,
}

impl Hit {
    fn at(t: f32, primitive: PackedRef) -> Self {
        Self {
            t,
            primitive,
            element: 0,
            param: Point2::origin(),
        }
    }

    fn triangle(hit: TriangleHit, primitive: PackedRef, element: u32) -> Self {
        Self {
            t: hit.t,
            primitive,
            element,
            param: Point2::new(hit.b1, hit.b2),
        }
    }

    fn curve(hit: CurveHit, primitive: PackedRef) -> Self {
        Self {
            t: hit.t,
            primitive,
            element: 0,
            param: Point2::new(hit.u, hit.v),
        }
    }
}

/// Whether a query stops at the first hit or keeps the nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Any,
    Nearest,
}

/// Intersection kernel over a compiled scene.
#[derive(Debug, Clone, Copy)]
pub struct Kernel<'a> {
    scene: &'a FlatScene,
    options: KernelOptions,
}

impl<'a> Kernel<'a> {
    /// Kernel reading `scene`.
    pub fn new(scene: &'a FlatScene, options: KernelOptions) -> Self {
        Self { scene, options }
    }

    /// The scene being read.
    pub fn scene(&self) -> &'a FlatScene {
        self.scene
    }

    /// True if `primitive` is hit anywhere in `(t_min, t_max)`.
    ///
    /// Meshes stop at the first triangle found.
    pub fn intersects(&self, primitive: PackedRef, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        self.primitive_hit(primitive, ray, t_min, t_max, Query::Any)
            .is_some()
    }

    /// Nearest hit on `primitive` in `(t_min, t_max)`.
    ///
    /// Unknown references never hit.
    pub fn intersection_t(
        &self,
        primitive: PackedRef,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        self.primitive_hit(primitive, ray, t_min, t_max, Query::Nearest)
    }

    /// Full surface record for a hit returned by this kernel for `ray`.
    ///
    /// `None` if the hit's primitive or element is not in the scene.
    pub fn compute_intersection(&self, ray: &Ray, hit: &Hit) -> Option<SurfaceInteraction> {
        let kind = hit.primitive.kind()?;
        if kind == ShapeKind::Mesh {
            let tri = self.scene.mesh_triangle(hit.element as usize)?;
            return Some(triangle::compute_intersection(ray, &tri, &triangle_hit(hit)));
        }

        let offset = hit.primitive.offset() as usize;
        let w = self.scene.table(kind).record(offset)?;
        let t = hit.t;
        let si = match kind {
            ShapeKind::Plane => plane::compute_intersection(ray, &Plane::read(w), t),
            ShapeKind::Sphere => sphere::compute_intersection(ray, &Sphere::read(w), t),
            ShapeKind::Disk => disk::compute_intersection(ray, &Disk::read(w), t),
            ShapeKind::Cone => cone::compute_intersection(ray, &Cone::read(w), t),
            ShapeKind::Cylinder => cylinder::compute_intersection(ray, &Cylinder::read(w), t),
            ShapeKind::Hyperboloid => {
                hyperboloid::compute_intersection(ray, &Hyperboloid::read(w), t)
            }
            ShapeKind::Paraboloid => paraboloid::compute_intersection(ray, &Paraboloid::read(w), t),
            ShapeKind::Polygon => {
                let record = PolygonRecord::read(w);
                let vertices = self.scene.polygon(&record)?;
                polygon::compute_intersection(ray, vertices, &record.normal, t)
            }
            ShapeKind::Rectangle => {
                polygon::rectangle_compute_intersection(ray, &Rectangle::read(w), t)
            }
            ShapeKind::RectangularCuboid => {
                cuboid::compute_intersection(ray, &RectangularCuboid::read(w), t)
            }
            ShapeKind::Torus => torus::compute_intersection(ray, &Torus::read(w), t),
            ShapeKind::Triangle => {
                triangle::compute_intersection(ray, &Triangle::read(w), &triangle_hit(hit))
            }
            ShapeKind::Curve => {
                let curve_hit = CurveHit {
                    t,
                    u: hit.param.x,
                    v: hit.param.y,
                };
                curve::compute_intersection(ray, &Curve::read(w), &curve_hit)
            }
            ShapeKind::Mesh => return None,
        };
        Some(si)
    }

    /// True if any top-level primitive is hit in `(t_min, t_max)`.
    pub fn occluded(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        self.scene.primitives().iter().any(|entry| {
            self.bounds_hit(entry.bounds, ray, t_min, t_max)
                && self.intersects(entry.reference(), ray, t_min, t_max)
        })
    }

    /// Nearest hit over all top-level primitives in `(t_min, t_max)`.
    ///
    /// Primitives whose bounds the ray misses inside the current window are
    /// skipped without being tested.
    pub fn nearest(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        let mut closest = t_max;
        for entry in self.scene.primitives() {
            if !self.bounds_hit(entry.bounds, ray, t_min, closest) {
                continue;
            }
            let hit = self.primitive_hit(entry.reference(), ray, t_min, closest, Query::Nearest);
            if let Some(hit) = hit {
                closest = hit.t;
                best = Some(hit);
            }
        }
        best
    }

    /// [`Kernel::nearest`] for every ray, in parallel.
    pub fn nearest_batch(&self, rays: &[Ray], t_min: f32, t_max: f32) -> Vec<Option<Hit>> {
        rays.par_iter()
            .map(|ray| self.nearest(ray, t_min, t_max))
            .collect()
    }

    fn bounds_hit(&self, index: u32, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        self.scene
            .bounds()
            .get(index as usize)
            .is_some_and(|b| ray.intersect_aabb(&b.to_aabb(), t_min, t_max).is_some())
    }

    fn primitive_hit(
        &self,
        primitive: PackedRef,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
        query: Query,
    ) -> Option<Hit> {
        let kind = primitive.kind()?;
        let offset = primitive.offset() as usize;
        if kind == ShapeKind::Mesh {
            let mesh = self.scene.meshes().get(offset)?;
            return self.mesh_hit(mesh, primitive, ray, t_min, t_max, query);
        }

        let w = self.scene.table(kind).record(offset)?;
        let (lo, hi) = (t_min, t_max);
        let t = match kind {
            ShapeKind::Plane => plane::intersection_t(ray, &Plane::read(w), lo, hi),
            ShapeKind::Sphere => sphere::intersection_t(ray, &Sphere::read(w), lo, hi),
            ShapeKind::Disk => disk::intersection_t(ray, &Disk::read(w), lo, hi),
            ShapeKind::Cone => cone::intersection_t(ray, &Cone::read(w), lo, hi),
            ShapeKind::Cylinder => cylinder::intersection_t(ray, &Cylinder::read(w), lo, hi),
            ShapeKind::Hyperboloid => {
                hyperboloid::intersection_t(ray, &Hyperboloid::read(w), lo, hi)
            }
            ShapeKind::Paraboloid => paraboloid::intersection_t(ray, &Paraboloid::read(w), lo, hi),
            ShapeKind::Polygon => {
                let record = PolygonRecord::read(w);
                let vertices = self.scene.polygon(&record)?;
                polygon::intersection_t(ray, vertices, &record.normal, lo, hi)
            }
            ShapeKind::Rectangle => {
                polygon::rectangle_intersection_t(ray, &Rectangle::read(w), lo, hi)
            }
            ShapeKind::RectangularCuboid => {
                cuboid::intersection_t(ray, &RectangularCuboid::read(w), lo, hi)
            }
            ShapeKind::Torus => {
                let precision = self.options.quartic_precision;
                torus::intersection_t(ray, &Torus::read(w), lo, hi, precision)
            }
            ShapeKind::Triangle => {
                let hit = triangle::intersection_t(ray, &Triangle::read(w), lo, hi)?;
                return Some(Hit::triangle(hit, primitive, 0));
            }
            ShapeKind::Curve => {
                let hit = curve::intersection_t(ray, &Curve::read(w), lo, hi)?;
                return Some(Hit::curve(hit, primitive));
            }
            ShapeKind::Mesh => None,
        };
        t.map(|t| Hit::at(t, primitive))
    }

    fn mesh_hit(
        &self,
        mesh: &MeshRecord,
        primitive: PackedRef,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
        query: Query,
    ) -> Option<Hit> {
        if mesh.bvh_base == END {
            return self.mesh_hit_brute_force(mesh, primitive, ray, t_min, t_max, query);
        }

        let words = self.scene.bvh_words().get(mesh.bvh_base as usize..)?;
        let boxes = self.scene.bounds();
        let mut best: Option<Hit> = None;
        let mut closest = t_max;
        let mut offset = 0i32;

        while offset != END {
            let record = words.get(offset as usize..)?;
            let header = record.get(..4)?;
            let (tag, next) = (header[0], header[2]);
            let aabb = boxes.get(header[1] as usize)?.to_aabb();

            let enter = aabb.contains_point(&ray.origin)
                || ray.intersect_aabb(&aabb, t_min, closest).is_some();
            if !enter {
                offset = next;
                continue;
            }

            if tag != TAG_LEAF {
                offset = header[3];
                continue;
            }

            let count = header[3].max(0) as usize;
            let body = record.get(4..record_words(header).min(record.len()))?;
            for &index in body.iter().take(count) {
                let Some(tri) = self.scene.mesh_triangle(index as usize) else {
                    continue;
                };
                if let Some(h) = triangle::intersection_t(ray, &tri, t_min, closest) {
                    let hit = Hit::triangle(h, primitive, index as u32);
                    if query == Query::Any {
                        return Some(hit);
                    }
                    closest = h.t;
                    best = Some(hit);
                }
            }
            offset = next;
        }

        best
    }

    fn mesh_hit_brute_force(
        &self,
        mesh: &MeshRecord,
        primitive: PackedRef,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
        query: Query,
    ) -> Option<Hit> {
        if !self.bounds_hit(mesh.bounds, ray, t_min, t_max) {
            return None;
        }
        let mut best: Option<Hit> = None;
        let mut closest = t_max;
        let first = mesh.first_triangle;
        for index in first..first + mesh.triangle_count {
            let Some(tri) = self.scene.mesh_triangle(index as usize) else {
                continue;
            };
            if let Some(h) = triangle::intersection_t(ray, &tri, t_min, closest) {
                let hit = Hit::triangle(h, primitive, index);
                if query == Query::Any {
                    return Some(hit);
                }
                closest = h.t;
                best = Some(hit);
            }
        }
        best
    }
}

fn triangle_hit(hit: &Hit) -> TriangleHit {
    TriangleHit {
        t: hit.t,
        b1: hit.param.x,
        b2: hit.param.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::SceneCompiler;
    use crate::config::CompileOptions;
    use crate::mesh::TriangleMesh;
    use crate::scene::Scene;
    use approx::assert_relative_eq;
    use flatray_math::{Point3, Transform, Vec3};

    fn material(i: u16) -> PackedRef {
        PackedRef::new(0x4D, i)
    }

    /// The unit quad spanning (-1,-1,0)..(1,1,0) as a two-triangle mesh.
    fn quad_scene(options: CompileOptions) -> FlatScene {
        let positions = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        let mesh =
            TriangleMesh::from_indexed(&positions, &[[0, 1, 2], [0, 2, 3]], &options).unwrap();
        let mut scene = Scene::new();
        scene.add(mesh, material(0));
        SceneCompiler::new(options).compile(&scene).unwrap()
    }

    #[test]
    fn test_quad_mesh_end_to_end() {
        for accelerate in [true, false] {
            let options = CompileOptions {
                accelerate_meshes: accelerate,
                ..CompileOptions::default()
            };
            let flat = quad_scene(options);
            let kernel = Kernel::new(&flat, KernelOptions::default());
            let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));

            let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
            assert_relative_eq!(hit.t, 5.0);
            assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Mesh, 0));
            assert_eq!(flat.material(hit.primitive), Some(material(0)));

            let si = kernel.compute_intersection(&ray, &hit).unwrap();
            assert_relative_eq!(si.point, Point3::origin(), epsilon = 1e-6);
            assert_relative_eq!(si.geometric.n, Vec3::z(), epsilon = 1e-6);
            assert_relative_eq!(si.uv.x, 0.5, epsilon = 1e-6);
            assert_relative_eq!(si.uv.y, 0.5, epsilon = 1e-6);

            assert!(kernel.occluded(&ray, 0.0, f32::INFINITY));
            assert!(!kernel.occluded(&ray, 0.0, 4.9));
            assert!(kernel.nearest(&ray, 5.1, f32::INFINITY).is_none());
        }
    }

    #[test]
    fn test_shared_diagonal_goes_to_first_triangle() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        for accelerate in [true, false] {
            let options = CompileOptions {
                accelerate_meshes: accelerate,
                ..CompileOptions::default()
            };
            let mesh =
                TriangleMesh::from_indexed(&positions, &[[0, 1, 2], [0, 2, 3]], &options).unwrap();
            let mut scene = Scene::new();
            scene.add(mesh, material(0));
            let flat = SceneCompiler::new(options).compile(&scene).unwrap();
            let kernel = Kernel::new(&flat, KernelOptions::default());

            // (0.5, 0.5) lies on the diagonal both triangles share.
            let ray = Ray::new(Point3::new(0.5, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
            let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
            assert_eq!(hit.t, 5.0);
            assert_eq!(hit.element, 0);
            assert_eq!(hit.param, Point2::new(0.0, 0.5));

            // The second triangle would have reported uv (0.5, 0).
            let si = kernel.compute_intersection(&ray, &hit).unwrap();
            assert_relative_eq!(si.point, Point3::new(0.5, 0.5, 0.0));
            assert_relative_eq!(si.geometric.n, Vec3::z());
            assert_relative_eq!(si.uv, Point2::new(0.5, 0.5));
        }
    }

    #[test]
    fn test_unknown_references_miss() {
        let flat = quad_scene(CompileOptions::default());
        let kernel = Kernel::new(&flat, KernelOptions::default());
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        for missing in [
            PackedRef::primitive(ShapeKind::Sphere, 0),
            PackedRef::primitive(ShapeKind::Mesh, 1),
            PackedRef::new(500, 0),
        ] {
            assert!(!kernel.intersects(missing, &ray, 0.0, f32::INFINITY));
            assert!(kernel.intersection_t(missing, &ray, 0.0, f32::INFINITY).is_none());
        }
        let bogus = Hit::at(1.0, PackedRef::primitive(ShapeKind::Torus, 3));
        assert!(kernel.compute_intersection(&ray, &bogus).is_none());
    }

    #[test]
    fn test_nearest_across_kinds() {
        let plane = Plane::new(Point3::origin(), Vec3::z()).unwrap();
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 3.0), 1.0).unwrap();
        let torus = Torus::new(Transform::translation(0.0, 0.0, 8.0), 2.0, 0.5).unwrap();
        let disk = Disk::new(Transform::translation(0.0, 0.0, 6.0), 0.0, 1.0).unwrap();
        let mut scene = Scene::new();
        scene
            .add(plane, material(0))
            .add(sphere, material(1))
            .add(torus, material(2))
            .add(disk, material(3));
        let flat = SceneCompiler::default().compile(&scene).unwrap();
        let kernel = Kernel::new(&flat, KernelOptions::default());

        // Straight down through the torus hole: disk at z = 6 first.
        let down = Ray::new(Point3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = kernel.nearest(&down, 0.0, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Disk, 0));
        assert_relative_eq!(hit.t, 4.0, epsilon = 1e-5);

        // Below the disk the sphere top is next, then the plane.
        let hit = kernel.nearest(&down, 4.5, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Sphere, 0));
        assert_relative_eq!(hit.t, 6.0, epsilon = 1e-5);
        let hit = kernel.nearest(&down, 8.5, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Plane, 0));
        assert_relative_eq!(hit.t, 10.0, epsilon = 1e-5);

        // Down through the tube: torus top at z = 8.5.
        let tube = Ray::new(Point3::new(2.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = kernel.nearest(&tube, 0.0, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Torus, 0));
        assert_relative_eq!(hit.t, 1.5, epsilon = 1e-3);
        let si = kernel.compute_intersection(&tube, &hit).unwrap();
        assert_relative_eq!(si.geometric.n, Vec3::z(), epsilon = 1e-3);
    }

    #[test]
    fn test_kernel_matches_direct_routines() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        );
        let mut scene = Scene::new();
        scene.add(tri, material(0));
        let flat = SceneCompiler::default().compile(&scene).unwrap();
        let kernel = Kernel::new(&flat, KernelOptions::default());

        let ray = Ray::new(Point3::new(0.5, 0.25, 3.0), Vec3::new(0.0, 0.0, -2.0));
        let direct = triangle::intersection_t(&ray, &tri, 0.0, f32::INFINITY).unwrap();
        let reference = PackedRef::primitive(ShapeKind::Triangle, 0);
        let hit = kernel
            .intersection_t(reference, &ray, 0.0, f32::INFINITY)
            .unwrap();
        assert_eq!(hit.t, direct.t);
        assert_eq!(hit.param, Point2::new(direct.b1, direct.b2));
        assert_eq!(
            kernel.compute_intersection(&ray, &hit).unwrap(),
            triangle::compute_intersection(&ray, &tri, &direct)
        );
    }

    #[test]
    fn test_batch_matches_sequential() {
        let flat = quad_scene(CompileOptions::default());
        let kernel = Kernel::new(&flat, KernelOptions::default());
        let rays: Vec<Ray> = (0..64)
            .map(|i| {
                let x = -1.5 + 3.0 * (i % 8) as f32 / 7.0;
                let y = -1.5 + 3.0 * (i / 8) as f32 / 7.0;
                Ray::new(Point3::new(x, y, 2.0), Vec3::new(0.05, -0.02, -1.0))
            })
            .collect();
        let batch = kernel.nearest_batch(&rays, 0.0, f32::INFINITY);
        assert_eq!(batch.len(), rays.len());
        for (ray, hit) in rays.iter().zip(&batch) {
            assert_eq!(*hit, kernel.nearest(ray, 0.0, f32::INFINITY));
        }
        assert!(batch.iter().any(Option::is_some));
        assert!(batch.iter().any(Option::is_none));
    }
}
