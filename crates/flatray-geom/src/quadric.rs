//! Quadrics, disks and the torus in their canonical object frames.
//!
//! Each shape is centred on the object-space z axis and carries an
//! object-to-world transform. Azimuthal clipping is `phi in [0, phi_max]`
//! measured from +x towards +y.

use std::f32::consts::PI;

use flatray_math::{Aabb, Point3, Transform, Vec3};

use crate::error::{check_non_negative, check_positive, GeomError, Result};

const TAU: f32 = 2.0 * PI;

fn check_phi_max(phi_max: f32) -> Result<f32> {
    if phi_max > 0.0 && phi_max <= TAU + 1e-6 {
        Ok(phi_max.min(TAU))
    } else {
        Err(GeomError::InvalidParameter {
            name: "phi_max",
            value: phi_max,
        })
    }
}

fn ordered(name: &'static str, lo: f32, hi: f32) -> Result<(f32, f32)> {
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        Ok((lo, hi))
    } else {
        Err(GeomError::InvalidParameter {
            name,
            value: hi - lo,
        })
    }
}

/// Approximate uniform scale of a transform (used for world-space areas).
fn linear_scale(t: &Transform) -> f32 {
    let axis = |v: Vec3| t.apply_vec(&v).norm();
    (axis(Vec3::x()) * axis(Vec3::y()) * axis(Vec3::z())).cbrt()
}

/// Area of a surface of revolution `r(z)` swept by `phi_max`, by Simpson's rule.
fn revolution_area(r: impl Fn(f32) -> f32, z0: f32, z1: f32, phi_max: f32) -> f32 {
    const STEPS: usize = 64;
    if z1 <= z0 {
        return 0.0;
    }
    let h = (z1 - z0) / STEPS as f32;
    let dr = |z: f32| {
        let e = h * 1e-2;
        (r(z + e) - r(z - e)) / (2.0 * e)
    };
    let f = |z: f32| r(z) * (1.0 + dr(z).powi(2)).sqrt();
    let mut sum = f(z0) + f(z1);
    for i in 1..STEPS {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * f(z0 + i as f32 * h);
    }
    phi_max * sum * h / 3.0
}

// =============================================================================
// Sphere
// =============================================================================

/// A (partial) sphere: the unit sphere in object space, clipped to
/// `z in [z_min, z_max]` and `phi in [0, phi_max]`.
///
/// The radius and centre are part of the object-to-world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Lower clip height in object space, in `[-1, 1]`.
    pub z_min: f32,
    /// Upper clip height in object space, in `[-1, 1]`.
    pub z_max: f32,
    /// Azimuthal extent in radians.
    pub phi_max: f32,
}

impl Sphere {
    /// Full sphere of `radius` centred at `center`.
    pub fn new(center: Point3, radius: f32) -> Result<Self> {
        let radius = check_positive("radius", radius)?;
        let scale = Transform::scale(radius, radius, radius)
            .ok_or(GeomError::NonInvertibleTransform)?;
        let to_world = Transform::translation(center.x, center.y, center.z).then(&scale);
        Self::partial(to_world, -1.0, 1.0, TAU)
    }

    /// Clipped unit sphere under an arbitrary transform.
    pub fn partial(
        object_to_world: Transform,
        z_min: f32,
        z_max: f32,
        phi_max: f32,
    ) -> Result<Self> {
        let (z_min, z_max) = ordered("z range", z_min.clamp(-1.0, 1.0), z_max.clamp(-1.0, 1.0))?;
        Ok(Self {
            object_to_world,
            z_min,
            z_max,
            phi_max: check_phi_max(phi_max)?,
        })
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        Aabb::new(
            Point3::new(-1.0, -1.0, self.z_min),
            Point3::new(1.0, 1.0, self.z_max),
        )
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        let r = linear_scale(&self.object_to_world);
        self.phi_max * r * r * (self.z_max - self.z_min)
    }
}

// =============================================================================
// Disk
// =============================================================================

/// An annulus at constant object-space `z = height`, between `inner_radius`
/// and `radius`, clipped to `phi in [0, phi_max]`.
///
/// A disk with `radius <= inner_radius` (including a zero radius) is
/// degenerate and never reports a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disk {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Object-space height of the disk plane.
    pub height: f32,
    /// Outer radius.
    pub radius: f32,
    /// Inner radius (hole).
    pub inner_radius: f32,
    /// Azimuthal extent in radians.
    pub phi_max: f32,
}

impl Disk {
    /// Full disk.
    pub fn new(object_to_world: Transform, height: f32, radius: f32) -> Result<Self> {
        Self::annulus(object_to_world, height, radius, 0.0, TAU)
    }

    /// Partial annulus.
    pub fn annulus(
        object_to_world: Transform,
        height: f32,
        radius: f32,
        inner_radius: f32,
        phi_max: f32,
    ) -> Result<Self> {
        Ok(Self {
            object_to_world,
            height,
            radius: check_non_negative("radius", radius)?,
            inner_radius: check_non_negative("inner_radius", inner_radius)?,
            phi_max: check_phi_max(phi_max)?,
        })
    }

    /// True if the disk has no area.
    pub fn is_degenerate(&self) -> bool {
        self.radius <= self.inner_radius
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        let r = self.radius;
        Aabb::new(
            Point3::new(-r, -r, self.height),
            Point3::new(r, r, self.height),
        )
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        let s = linear_scale(&self.object_to_world);
        0.5 * self.phi_max * (self.radius.powi(2) - self.inner_radius.powi(2)) * s * s
    }
}

// =============================================================================
// Cylinder
// =============================================================================

/// An open cylinder of `radius` around the object z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Radius.
    pub radius: f32,
    /// Lower clip height.
    pub z_min: f32,
    /// Upper clip height.
    pub z_max: f32,
    /// Azimuthal extent in radians.
    pub phi_max: f32,
}

impl Cylinder {
    /// Create a clipped cylinder.
    pub fn new(
        object_to_world: Transform,
        radius: f32,
        z_min: f32,
        z_max: f32,
        phi_max: f32,
    ) -> Result<Self> {
        let (z_min, z_max) = ordered("z range", z_min, z_max)?;
        Ok(Self {
            object_to_world,
            radius: check_positive("radius", radius)?,
            z_min,
            z_max,
            phi_max: check_phi_max(phi_max)?,
        })
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        let r = self.radius;
        Aabb::new(
            Point3::new(-r, -r, self.z_min),
            Point3::new(r, r, self.z_max),
        )
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        let s = linear_scale(&self.object_to_world);
        (self.z_max - self.z_min) * self.radius * self.phi_max * s * s
    }
}

// =============================================================================
// Cone
// =============================================================================

/// An open cone with its base circle of `radius` at `z = 0` and its apex at
/// `z = height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Base radius.
    pub radius: f32,
    /// Apex height.
    pub height: f32,
    /// Azimuthal extent in radians.
    pub phi_max: f32,
}

impl Cone {
    /// Create a cone.
    pub fn new(object_to_world: Transform, radius: f32, height: f32, phi_max: f32) -> Result<Self> {
        Ok(Self {
            object_to_world,
            radius: check_positive("radius", radius)?,
            height: check_positive("height", height)?,
            phi_max: check_phi_max(phi_max)?,
        })
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        let r = self.radius;
        Aabb::new(Point3::new(-r, -r, 0.0), Point3::new(r, r, self.height))
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        let s = linear_scale(&self.object_to_world);
        let slant = (self.height.powi(2) + self.radius.powi(2)).sqrt();
        0.5 * self.radius * slant * self.phi_max * s * s
    }
}

// =============================================================================
// Hyperboloid
// =============================================================================

/// A hyperboloid of one sheet, `a_h·(x² + y²) − c_h·z² = 1`, clipped in height
/// and azimuth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperboloid {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Radial coefficient.
    pub a_h: f32,
    /// Axial coefficient.
    pub c_h: f32,
    /// Lower clip height.
    pub z_min: f32,
    /// Upper clip height.
    pub z_max: f32,
    /// Azimuthal extent in radians.
    pub phi_max: f32,
}

impl Hyperboloid {
    /// Hyperboloid with `waist_radius` at `z = 0` whose radius grows as
    /// `sqrt(waist² + (slope·z)²)`.
    pub fn new(
        object_to_world: Transform,
        waist_radius: f32,
        slope: f32,
        z_min: f32,
        z_max: f32,
        phi_max: f32,
    ) -> Result<Self> {
        let waist = check_positive("waist_radius", waist_radius)?;
        let slope = check_non_negative("slope", slope)?;
        let (z_min, z_max) = ordered("z range", z_min, z_max)?;
        Ok(Self {
            object_to_world,
            a_h: 1.0 / (waist * waist),
            c_h: slope * slope / (waist * waist),
            z_min,
            z_max,
            phi_max: check_phi_max(phi_max)?,
        })
    }

    /// Radius of the surface at height `z`.
    pub fn radius_at(&self, z: f32) -> f32 {
        ((1.0 + self.c_h * z * z) / self.a_h).sqrt()
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        let r = self.radius_at(self.z_min).max(self.radius_at(self.z_max));
        Aabb::new(
            Point3::new(-r, -r, self.z_min),
            Point3::new(r, r, self.z_max),
        )
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        let s = linear_scale(&self.object_to_world);
        revolution_area(|z| self.radius_at(z), self.z_min, self.z_max, self.phi_max) * s * s
    }
}

// =============================================================================
// Paraboloid
// =============================================================================

/// A paraboloid `z = z_max·(x² + y²)/radius²`, clipped to `[z_min, z_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paraboloid {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Radius at `z_max`.
    pub radius: f32,
    /// Lower clip height (non-negative).
    pub z_min: f32,
    /// Upper clip height.
    pub z_max: f32,
    /// Azimuthal extent in radians.
    pub phi_max: f32,
}

impl Paraboloid {
    /// Create a clipped paraboloid.
    pub fn new(
        object_to_world: Transform,
        radius: f32,
        z_min: f32,
        z_max: f32,
        phi_max: f32,
    ) -> Result<Self> {
        let z_min = check_non_negative("z_min", z_min)?;
        let z_max = check_positive("z_max", z_max)?;
        let (z_min, z_max) = ordered("z range", z_min, z_max)?;
        Ok(Self {
            object_to_world,
            radius: check_positive("radius", radius)?,
            z_min,
            z_max,
            phi_max: check_phi_max(phi_max)?,
        })
    }

    /// Curvature constant `k` in `z = k·(x² + y²)`.
    pub fn k(&self) -> f32 {
        self.z_max / (self.radius * self.radius)
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        let r = self.radius;
        Aabb::new(
            Point3::new(-r, -r, self.z_min),
            Point3::new(r, r, self.z_max),
        )
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        let s = linear_scale(&self.object_to_world);
        let k = self.k();
        let k4 = 4.0 * k;
        // Closed form for the paraboloid of revolution.
        let a = |z: f32| (1.0 + k4 * z).powf(1.5);
        let full = PI / (6.0 * k * k) * (a(self.z_max) - a(self.z_min));
        full * (self.phi_max / TAU) * s * s
    }
}

// =============================================================================
// Torus
// =============================================================================

/// A ring torus around the object z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torus {
    /// Object-to-world transform.
    pub object_to_world: Transform,
    /// Distance from the axis to the centre of the tube.
    pub major_radius: f32,
    /// Tube radius.
    pub minor_radius: f32,
}

impl Torus {
    /// Create a torus.
    pub fn new(object_to_world: Transform, major_radius: f32, minor_radius: f32) -> Result<Self> {
        Ok(Self {
            object_to_world,
            major_radius: check_positive("major_radius", major_radius)?,
            minor_radius: check_positive("minor_radius", minor_radius)?,
        })
    }

    /// Object-space bounds.
    pub fn object_bounds(&self) -> Aabb {
        let outer = self.major_radius + self.minor_radius;
        let r = self.minor_radius;
        Aabb::new(
            Point3::new(-outer, -outer, -r),
            Point3::new(outer, outer, r),
        )
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.object_bounds().transformed(&self.object_to_world)
    }

    /// Surface area, assuming a uniform scale.
    pub fn area(&self) -> f32 {
        let s = linear_scale(&self.object_to_world);
        4.0 * PI * PI * self.major_radius * self.minor_radius * s * s
    }
}
