//! Ray/primitive intersection algorithms.
//!
//! Every primitive kind has its own module with two entry points:
//!
//! - `intersection_t` returns the smallest hit strictly inside the window
//!   `(t_min, t_max)`, or `None`. Triangles and curves also return the
//!   surface parameters found on the way.
//! - `compute_intersection` builds the full [`SurfaceInteraction`] for a hit
//!   previously returned by `intersection_t` on the same ray and primitive.
//!
//! Analytic quadrics solve in object space; the ray is mapped with the
//! inverse transform but not renormalized, so `t` is shared with world space.
//!
//! [`SurfaceInteraction`]: flatray_geom::SurfaceInteraction

pub mod cone;
pub mod cuboid;
pub mod curve;
pub mod cylinder;
pub mod disk;
pub mod hyperboloid;
pub mod paraboloid;
pub mod plane;
pub mod polygon;
pub mod sphere;
pub mod torus;
pub mod triangle;

pub use curve::CurveHit;
pub use torus::QuarticPrecision;
pub use triangle::TriangleHit;

use std::f32::consts::TAU;

use flatray_math::poly::solve_quadratic;
use flatray_math::{azimuth, Frame, Point3, Transform, Vec3};

/// True if `t` lies strictly inside the window.
#[inline]
pub fn in_window(t: f32, t_min: f32, t_max: f32) -> bool {
    t > t_min && t < t_max
}

/// Smallest root of `a·t² + b·t + c` inside the window that `accept`s.
///
/// Roots are tried in ascending order, so a near root rejected by clipping
/// falls through to the far one.
pub(crate) fn nearest_quadratic_root(
    a: f32,
    b: f32,
    c: f32,
    t_min: f32,
    t_max: f32,
    accept: impl Fn(f32) -> bool,
) -> Option<f32> {
    solve_quadratic(a, b, c)
        .as_slice()
        .iter()
        .copied()
        .find(|&t| in_window(t, t_min, t_max) && accept(t))
}

/// Azimuthal clip test for an object-space point.
#[inline]
pub(crate) fn phi_in_range(x: f32, y: f32, phi_max: f32) -> bool {
    phi_max >= TAU || azimuth(x, y) <= phi_max
}

/// Geometric frame of an object-space hit mapped to world space.
///
/// `gradient` is the object-space implicit-surface gradient (outward),
/// `dpdu` the object-space tangent along `u`.
pub(crate) fn world_frame(to_world: &Transform, gradient: &Vec3, dpdu: &Vec3) -> Frame {
    let n = to_world.apply_normal(gradient);
    let s = to_world.apply_vec(dpdu);
    Frame::from_normal_tangent(&n, &s)
}

/// Even-odd point-in-polygon test in the projection that drops `axis`.
pub(crate) fn point_in_polygon(vertices: &[Point3], axis: usize, p: &Point3) -> bool {
    let (i, j) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let (px, py) = (p[i], p[j]);
    let mut inside = false;
    let mut prev = vertices[vertices.len() - 1];
    for v in vertices {
        let (ax, ay) = (prev[i], prev[j]);
        let (bx, by) = (v[i], v[j]);
        if (ay > py) != (by > py) {
            let x_cross = ax + (py - ay) * (bx - ax) / (by - ay);
            if px < x_cross {
                inside = !inside;
            }
        }
        prev = *v;
    }
    inside
}
