//! Ray-torus intersection (quartic equation).
//!
//! The quartic is solved with Ferrari's method in either single or double
//! precision. Double precision is robust near grazing and self-touching
//! configurations; single precision is faster but can drop or smear roots
//! there. Both paths are kept and selected by [`QuarticPrecision`].

use std::f32::consts::TAU;

use flatray_geom::{SurfaceInteraction, Torus};
use flatray_math::poly::{solve_quartic, Roots};
use flatray_math::{azimuth, Point2, Point3, Vec3};
use num_traits::{Float, NumCast};
use serde::{Deserialize, Serialize};

use super::{in_window, world_frame};
use crate::Ray;

/// Floating-point precision of the torus quartic solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuarticPrecision {
    /// Solve in `f32`.
    Single,
    /// Solve in `f64`.
    #[default]
    Double,
}

fn lift<T: Float>(v: f32) -> T {
    <T as NumCast>::from(v).unwrap_or_else(T::nan)
}

/// Roots of the ray/torus quartic for an object-space ray.
///
/// The torus is `(|p|² + R² − r²)² = 4R²(x² + y²)`; substituting `o + t·d`
/// gives `c4·t⁴ + c3·t³ + c2·t² + c1·t + c0 = 0`.
fn torus_roots<T: Float>(o: &Point3, d: &Vec3, major: f32, minor: f32) -> Roots<T> {
    let (ox, oy, oz) = (lift::<T>(o.x), lift::<T>(o.y), lift::<T>(o.z));
    let (dx, dy, dz) = (lift::<T>(d.x), lift::<T>(d.y), lift::<T>(d.z));
    let r2 = lift::<T>(major) * lift::<T>(major);
    let a2 = lift::<T>(minor) * lift::<T>(minor);
    let two = lift::<T>(2.0);
    let four = lift::<T>(4.0);

    let dd = dx * dx + dy * dy + dz * dz;
    let od = ox * dx + oy * dy + oz * dz;
    let oo = ox * ox + oy * oy + oz * oz;
    let k = oo + r2 - a2;

    let c4 = dd * dd;
    let c3 = four * dd * od;
    let c2 = two * dd * k + four * od * od - four * r2 * (dx * dx + dy * dy);
    let c1 = four * od * k - lift::<T>(8.0) * r2 * (ox * dx + oy * dy);
    let c0 = k * k - four * r2 * (ox * ox + oy * oy);

    solve_quartic(c4, c3, c2, c1, c0)
}

fn first_root<T: Float>(roots: &Roots<T>, t_min: f32, t_max: f32) -> Option<f32> {
    roots
        .as_slice()
        .iter()
        .filter_map(|r| r.to_f32())
        .find(|&t| in_window(t, t_min, t_max))
}

/// Intersect a ray with a torus, solving the quartic at `precision`.
pub fn intersection_t(
    ray: &Ray,
    torus: &Torus,
    t_min: f32,
    t_max: f32,
    precision: QuarticPrecision,
) -> Option<f32> {
    let local = ray.to_object(&torus.object_to_world);
    let (o, d) = (local.origin, local.direction);
    match precision {
        QuarticPrecision::Double => first_root(
            &torus_roots::<f64>(&o, &d, torus.major_radius, torus.minor_radius),
            t_min,
            t_max,
        ),
        QuarticPrecision::Single => first_root(
            &torus_roots::<f32>(&o, &d, torus.major_radius, torus.minor_radius),
            t_min,
            t_max,
        ),
    }
}

/// Surface record for a torus hit at `t`.
///
/// `u` is the toroidal angle around the z axis and `v` the poloidal angle
/// around the tube (0 on the outer equator), both normalized to `[0, 1)`.
pub fn compute_intersection(ray: &Ray, torus: &Torus, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&torus.object_to_world);
    let p = local.at(t);
    let rho = (p.x * p.x + p.y * p.y).sqrt();

    let uv = Point2::new(
        azimuth(p.x, p.y) / TAU,
        azimuth(rho - torus.major_radius, p.z) / TAU,
    );

    let scale = if rho > 0.0 {
        1.0 - torus.major_radius / rho
    } else {
        0.0
    };
    let gradient = Vec3::new(p.x * scale, p.y * scale, p.z);
    let dpdu = Vec3::new(-TAU * p.y, TAU * p.x, 0.0);
    let frame = world_frame(&torus.object_to_world, &gradient, &dpdu);
    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}
