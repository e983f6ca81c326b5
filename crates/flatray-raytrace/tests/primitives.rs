//! Every primitive kind through the compiled scene and the kernel.

use std::f32::consts::{FRAC_PI_2, TAU};

use approx::assert_relative_eq;
use flatray_geom::{
    Cone, Curve, CurveKind, Cylinder, Disk, Hyperboloid, PackedRef, Paraboloid, Plane, Polygon,
    Rectangle, RectangularCuboid, ShapeKind, Sphere, Torus, Triangle,
};
use flatray_math::{Point3, Transform, Vec3};
use flatray_raytrace::intersect::{
    cone, cuboid, curve, cylinder, disk, hyperboloid, paraboloid, plane, polygon, sphere, torus,
    triangle,
};
use flatray_raytrace::{
    FlatScene, Kernel, KernelOptions, QuarticPrecision, Ray, Scene, SceneCompiler, SceneObject,
    Shape, TriangleMesh,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn compile(scene: &Scene) -> FlatScene {
    SceneCompiler::default().compile(scene).unwrap()
}

fn single(shape: impl Into<Shape>) -> FlatScene {
    let mut scene = Scene::new();
    scene.add(shape, PackedRef::default());
    compile(&scene)
}

fn random_point(rng: &mut StdRng, extent: f32) -> Point3 {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

#[test]
fn sphere_from_outside() {
    let flat = single(Sphere::new(Point3::origin(), 2.0).unwrap());
    let kernel = Kernel::new(&flat, KernelOptions::default());
    let ray = Ray::new(Point3::new(0.0, 0.0, -10.0), Vec3::z());

    let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
    assert_relative_eq!(hit.t, 8.0, epsilon = 1e-5);
    assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Sphere, 0));

    let si = kernel.compute_intersection(&ray, &hit).unwrap();
    assert_relative_eq!(si.point.z, -2.0, epsilon = 1e-5);
    assert_relative_eq!(si.geometric.n.z.abs(), 1.0, epsilon = 1e-5);

    // Window closes before the far side.
    assert!(kernel.nearest(&ray, 8.5, 11.0).is_none());
    let far = kernel.nearest(&ray, 8.5, 12.5).unwrap();
    assert_relative_eq!(far.t, 12.0, epsilon = 1e-4);
}

#[test]
fn plane_with_unnormalized_direction() {
    let flat = single(Plane::new(Point3::origin(), Vec3::z()).unwrap());
    let kernel = Kernel::new(&flat, KernelOptions::default());
    let ray = Ray::new(Point3::new(3.0, -1.0, 1.0), Vec3::new(0.0, 0.0, -2.0));

    let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
    assert_relative_eq!(hit.t, 0.5);
    let si = kernel.compute_intersection(&ray, &hit).unwrap();
    assert_relative_eq!(si.point, Point3::new(3.0, -1.0, 0.0));

    let parallel = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::x());
    assert!(kernel.nearest(&parallel, 0.0, f32::INFINITY).is_none());
}

#[test]
fn disk_texture_coordinates() {
    let flat = single(Disk::new(Transform::identity(), 0.0, 2.0).unwrap());
    let kernel = Kernel::new(&flat, KernelOptions::default());
    let ray = Ray::new(Point3::new(1.0, 0.0, 5.0), -Vec3::z());

    let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
    assert_relative_eq!(hit.t, 5.0);
    let si = kernel.compute_intersection(&ray, &hit).unwrap();
    assert_relative_eq!(si.uv.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(si.uv.y, 0.5, epsilon = 1e-6);

    let outside = Ray::new(Point3::new(2.5, 0.0, 5.0), -Vec3::z());
    assert!(kernel.nearest(&outside, 0.0, f32::INFINITY).is_none());
}

#[test]
fn degenerate_primitives_never_hit() {
    let segment = Triangle::new(
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
    );
    let point = Triangle::new(Point3::origin(), Point3::origin(), Point3::origin());
    // Collinear in exact arithmetic, but rounding leaves a tiny nonzero area.
    let a = Vec3::new(0.1, 0.7, 0.3);
    let rounded = Triangle::new(
        Point3::from(a),
        Point3::from(a * 3.0),
        Point3::from(a * 7.1),
    );

    let mut scene = Scene::new();
    scene
        .add(
            Disk::new(Transform::identity(), 0.0, 0.0).unwrap(),
            PackedRef::default(),
        )
        .add(segment, PackedRef::default())
        .add(TriangleMesh::new(vec![point]), PackedRef::default())
        .add(TriangleMesh::new(vec![rounded]), PackedRef::default());
    let flat = compile(&scene);
    let kernel = Kernel::new(&flat, KernelOptions::default());

    let directions = [
        -Vec3::z(),
        Vec3::new(0.0, -1.0, -1.0),
        Vec3::new(0.3, 0.2, -1.0),
    ];
    for target in [0.0, 2.0, 5.0].map(|s| Point3::from(a * s)) {
        for direction in directions {
            let ray = Ray::new(target - direction * 3.0, direction);
            assert!(kernel.nearest(&ray, 0.0, f32::INFINITY).is_none());
            assert!(!kernel.occluded(&ray, 0.0, f32::INFINITY));
        }
    }
}

#[test]
fn polygon_through_vertex_pool() {
    let square = |z: f32| {
        Polygon::new(vec![
            Point3::new(-1.0, -1.0, z),
            Point3::new(1.0, -1.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(-1.0, 1.0, z),
        ])
        .unwrap()
    };
    let l_shape = Polygon::new(vec![
        Point3::new(0.0, 0.0, 4.0),
        Point3::new(2.0, 0.0, 4.0),
        Point3::new(2.0, 1.0, 4.0),
        Point3::new(1.0, 1.0, 4.0),
        Point3::new(1.0, 2.0, 4.0),
        Point3::new(0.0, 2.0, 4.0),
    ])
    .unwrap();

    let mut scene = Scene::new();
    scene
        .add(square(1.0), PackedRef::default())
        .add(l_shape, PackedRef::default())
        .add(square(2.0), PackedRef::default());
    let flat = compile(&scene);
    assert_eq!(flat.polygon_vertices().len(), 14);
    let kernel = Kernel::new(&flat, KernelOptions::default());

    let up = |x: f32, y: f32| Ray::new(Point3::new(x, y, 0.0), Vec3::z());
    let hit = kernel.nearest(&up(0.5, 0.5), 0.0, f32::INFINITY).unwrap();
    assert_relative_eq!(hit.t, 1.0);
    assert_eq!(hit.primitive, PackedRef::primitive(ShapeKind::Polygon, 0));

    // The L's notch is empty; past the squares it hits nothing.
    let notch = up(1.5, 1.5);
    let l_ref = PackedRef::primitive(ShapeKind::Polygon, 1);
    assert!(kernel.intersection_t(l_ref, &notch, 0.0, f32::INFINITY).is_none());
    assert!(kernel.nearest(&notch, 0.0, f32::INFINITY).is_none());
    let past_notch = kernel.intersection_t(l_ref, &up(1.5, 0.5), 0.0, f32::INFINITY);
    assert_relative_eq!(past_notch.unwrap().t, 4.0);

    let top = PackedRef::primitive(ShapeKind::Polygon, 2);
    let top_hit = kernel.intersection_t(top, &up(0.5, 0.5), 0.0, f32::INFINITY);
    assert_relative_eq!(top_hit.unwrap().t, 2.0);
}

#[test]
fn curve_through_kernel() {
    let cp = [
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(-0.3, 0.2, 0.0),
        Point3::new(0.3, -0.2, 0.0),
        Point3::new(1.0, 0.0, 0.0),
    ];
    let segment = Curve::new(cp, [0.2, 0.2], CurveKind::Flat).unwrap();
    let flat = single(segment);
    let kernel = Kernel::new(&flat, KernelOptions::default());

    let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), -Vec3::z());
    let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
    assert_relative_eq!(hit.t, 5.0, epsilon = 1e-2);
    let direct = curve::intersection_t(&ray, &segment, 0.0, f32::INFINITY).unwrap();
    assert_eq!(hit.t, direct.t);
    assert_eq!(hit.param.x, direct.u);

    let si = kernel.compute_intersection(&ray, &hit).unwrap();
    assert_relative_eq!(si.uv.x, direct.u);

    let beside = Ray::new(Point3::new(0.0, 0.5, 5.0), -Vec3::z());
    assert!(kernel.nearest(&beside, 0.0, f32::INFINITY).is_none());
}

/// One instance of every kind, each roughly inside the unit-ish cube around
/// the origin, with non-trivial transforms.
fn zoo() -> Vec<Shape> {
    let moved = |x: f32, y: f32, z: f32| Transform::translation(x, y, z);
    let tilted = Transform::rotation_x(0.4).then(&Transform::translation(0.5, -0.5, 0.0));
    let squashed = Transform::scale(1.0, 0.7, 1.3)
        .unwrap()
        .then(&Transform::rotation_z(0.9));
    let sideways = Transform::rotation_y(FRAC_PI_2).then(&moved(1.5, -1.0, 0.0));
    let spun = Transform::rotation_x(1.1).then(&moved(0.0, 0.5, 1.8));

    vec![
        Plane::new(Point3::new(0.0, 0.0, -3.0), Vec3::new(0.1, 0.2, 1.0))
            .unwrap()
            .into(),
        Sphere::new(Point3::new(1.0, 1.0, 0.5), 0.8).unwrap().into(),
        Disk::annulus(tilted, 0.2, 1.5, 0.4, 4.0).unwrap().into(),
        Cone::new(moved(-1.5, 0.0, -1.0), 0.9, 1.6, TAU)
            .unwrap()
            .into(),
        Cylinder::new(squashed, 0.6, -1.0, 1.0, 5.0).unwrap().into(),
        Hyperboloid::new(moved(0.0, -1.5, 0.0), 0.4, 0.8, -1.0, 1.0, TAU)
            .unwrap()
            .into(),
        Paraboloid::new(sideways, 0.7, 0.0, 1.2, TAU)
            .unwrap()
            .into(),
        Polygon::new(vec![
            Point3::new(-2.0, 1.0, 1.5),
            Point3::new(-1.0, 1.2, 1.5),
            Point3::new(-1.2, 2.0, 1.5),
            Point3::new(-2.2, 1.8, 1.5),
        ])
        .unwrap()
        .into(),
        Rectangle::new(
            Point3::new(0.5, 1.5, -1.0),
            Vec3::new(1.0, 0.0, 0.2),
            Vec3::new(0.0, 0.8, 0.5),
        )
        .unwrap()
        .into(),
        RectangularCuboid::new(Point3::new(-0.5, -0.4, -2.0), Point3::new(0.3, 0.6, -1.2))
            .unwrap()
            .into(),
        Torus::new(spun, 0.9, 0.25).unwrap().into(),
        Triangle::new(
            Point3::new(-1.0, -2.0, 2.0),
            Point3::new(0.5, -1.8, 2.2),
            Point3::new(-0.2, -0.8, 1.6),
        )
        .into(),
        Curve::new(
            [
                Point3::new(-2.0, -1.0, 0.0),
                Point3::new(-1.0, -0.5, 1.0),
                Point3::new(0.0, -1.5, 0.5),
                Point3::new(1.0, -1.0, 1.5),
            ],
            [0.3, 0.1],
            CurveKind::Cylinder,
        )
        .unwrap()
        .into(),
        TriangleMesh::new(vec![
            Triangle::new(
                Point3::new(1.0, 1.0, -1.0),
                Point3::new(2.0, 1.0, -1.0),
                Point3::new(1.0, 2.0, -0.5),
            ),
            Triangle::new(
                Point3::new(2.0, 1.0, -1.0),
                Point3::new(2.0, 2.0, -0.5),
                Point3::new(1.0, 2.0, -0.5),
            ),
        ])
        .into(),
    ]
}

fn direct_t(shape: &Shape, ray: &Ray, precision: QuarticPrecision) -> Option<f32> {
    let (lo, hi) = (0.0, f32::INFINITY);
    match shape {
        Shape::Plane(s) => plane::intersection_t(ray, s, lo, hi),
        Shape::Sphere(s) => sphere::intersection_t(ray, s, lo, hi),
        Shape::Disk(s) => disk::intersection_t(ray, s, lo, hi),
        Shape::Cone(s) => cone::intersection_t(ray, s, lo, hi),
        Shape::Cylinder(s) => cylinder::intersection_t(ray, s, lo, hi),
        Shape::Hyperboloid(s) => hyperboloid::intersection_t(ray, s, lo, hi),
        Shape::Paraboloid(s) => paraboloid::intersection_t(ray, s, lo, hi),
        Shape::Polygon(s) => polygon::intersection_t(ray, &s.vertices, &s.normal, lo, hi),
        Shape::Rectangle(s) => polygon::rectangle_intersection_t(ray, s, lo, hi),
        Shape::RectangularCuboid(s) => cuboid::intersection_t(ray, s, lo, hi),
        Shape::Torus(s) => torus::intersection_t(ray, s, lo, hi, precision),
        Shape::Triangle(s) => triangle::intersection_t(ray, s, lo, hi).map(|h| h.t),
        Shape::Curve(s) => curve::intersection_t(ray, s, lo, hi).map(|h| h.t),
        Shape::Mesh(s) => s.nearest_hit(ray, lo, hi).map(|(_, h)| h.t),
    }
}

#[test]
fn kernel_agrees_with_direct_routines() {
    let shapes = zoo();
    let scene: Scene = shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| SceneObject {
            shape: shape.clone(),
            material: PackedRef::new(9, i as u16),
        })
        .collect();
    let flat = compile(&scene);
    let options = KernelOptions::default();
    let kernel = Kernel::new(&flat, options);

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut hits_per_kind = vec![0usize; shapes.len()];
    for _ in 0..2000 {
        let origin = random_point(&mut rng, 6.0);
        let target = random_point(&mut rng, 2.0);
        let ray = Ray::new(origin, (target - origin) * rng.gen_range(0.1..3.0));

        let mut expected_nearest: Option<f32> = None;
        for (i, shape) in shapes.iter().enumerate() {
            let reference = PackedRef::primitive(shape.kind(), 0);
            assert_eq!(flat.material(reference), Some(PackedRef::new(9, i as u16)));

            let expected = direct_t(shape, &ray, options.quartic_precision);
            let got = kernel.intersection_t(reference, &ray, 0.0, f32::INFINITY);
            assert_eq!(got.map(|h| h.t), expected, "{:?}", shape.kind());
            assert_eq!(
                kernel.intersects(reference, &ray, 0.0, f32::INFINITY),
                expected.is_some()
            );

            if let (Some(hit), Some(t)) = (got, expected) {
                hits_per_kind[i] += 1;
                assert_eq!(hit.primitive, reference);
                let si = kernel.compute_intersection(&ray, &hit).unwrap();
                assert_eq!(si.t, t);
                let n = si.geometric.n;
                assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-3);
                expected_nearest = Some(expected_nearest.map_or(t, |best: f32| best.min(t)));
            }
        }

        let nearest = kernel.nearest(&ray, 0.0, f32::INFINITY).map(|h| h.t);
        assert_eq!(nearest, expected_nearest);
    }

    // The sampling actually reaches every kind.
    for (shape, count) in shapes.iter().zip(&hits_per_kind) {
        assert!(*count > 0, "{:?} never hit", shape.kind());
    }
}

#[test]
fn batch_queries_match_single_queries() {
    let mut scene = Scene::new();
    for shape in zoo() {
        scene.add(shape, PackedRef::default());
    }
    let flat = compile(&scene);
    let kernel = Kernel::new(&flat, KernelOptions::default());

    let mut rng = StdRng::seed_from_u64(42);
    let rays: Vec<Ray> = (0..500)
        .map(|_| {
            let origin = Point3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), 6.0);
            let target = Point3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), 0.0);
            Ray::new(origin, target - origin)
        })
        .collect();

    let batch = kernel.nearest_batch(&rays, 0.0, f32::INFINITY);
    assert_eq!(batch.len(), rays.len());
    for (ray, hit) in rays.iter().zip(&batch) {
        assert_eq!(*hit, kernel.nearest(ray, 0.0, f32::INFINITY));
    }
}
