//! Ray-disk intersection: the disk's constant-z plane plus annulus and
//! azimuth clipping.

use flatray_geom::{Disk, SurfaceInteraction};
use flatray_math::{azimuth, Point2, Vec3, PARALLEL_EPSILON};

use super::{in_window, phi_in_range, world_frame};
use crate::Ray;

/// Intersect a ray with a disk or partial annulus.
///
/// Degenerate disks (`radius <= inner_radius`) always miss.
pub fn intersection_t(ray: &Ray, disk: &Disk, t_min: f32, t_max: f32) -> Option<f32> {
    if disk.is_degenerate() {
        return None;
    }
    let local = ray.to_object(&disk.object_to_world);
    if local.direction.z.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (disk.height - local.origin.z) / local.direction.z;
    if !in_window(t, t_min, t_max) {
        return None;
    }
    let p = local.at(t);
    let r2 = p.x * p.x + p.y * p.y;
    if r2 > disk.radius * disk.radius || r2 < disk.inner_radius * disk.inner_radius {
        return None;
    }
    phi_in_range(p.x, p.y, disk.phi_max).then_some(t)
}

/// Surface record for a disk hit at `t`.
///
/// `u = phi / phi_max`, `v` runs from 0 at the rim to 1 at the inner radius.
pub fn compute_intersection(ray: &Ray, disk: &Disk, t: f32) -> SurfaceInteraction {
    let local = ray.to_object(&disk.object_to_world);
    let p = local.at(t);
    let r = (p.x * p.x + p.y * p.y).sqrt();
    let phi = azimuth(p.x, p.y);
    let uv = Point2::new(
        phi / disk.phi_max,
        (disk.radius - r) / (disk.radius - disk.inner_radius),
    );
    let dpdu = Vec3::new(-disk.phi_max * p.y, disk.phi_max * p.x, 0.0);
    let frame = world_frame(&disk.object_to_world, &Vec3::z(), &dpdu);
    SurfaceInteraction::new(t, ray.at(t), frame, uv)
}
