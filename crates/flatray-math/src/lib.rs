#![warn(missing_docs)]

//! Math types for the flatray intersection core.
//!
//! Thin wrappers around nalgebra providing the single-precision types the
//! flat-array kernel works with: points, vectors, affine transforms with a
//! cached inverse, axis-aligned boxes, orthonormal frames and the polynomial
//! solvers used by the analytic intersectors.

mod aabb;
mod frame;
pub mod poly;

pub use aabb::Aabb;
pub use frame::Frame;

use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f32>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f32>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f32>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f32>;

/// Denominator threshold below which a ray is treated as parallel to a plane.
pub const PARALLEL_EPSILON: f32 = 1e-7;

/// Relative threshold below which a triangle is treated as degenerate.
///
/// It scales with the edge lengths, so float-collinear vertices are caught at
/// any size: a triangle is degenerate when `|e1 × e2| <= DET_EPSILON·|e1|·|e2|`,
/// and a ray misses when `|det| <= DET_EPSILON·|e1|·|e2|·|d|`.
pub const DET_EPSILON: f32 = 1e-5;

/// An affine transformation with its inverse cached alongside.
///
/// Shapes store their object-to-world transform; intersection code needs the
/// inverse on every query, so it is computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// The forward 4x4 matrix.
    pub matrix: Matrix4<f32>,
    /// Inverse of `matrix`.
    pub inverse: Matrix4<f32>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// Build a transform from a matrix, or `None` if it is singular.
    pub fn from_matrix(matrix: Matrix4<f32>) -> Option<Self> {
        matrix.try_inverse().map(|inverse| Self { matrix, inverse })
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f32, dy: f32, dz: f32) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        let mut inv = Matrix4::identity();
        inv[(0, 3)] = -dx;
        inv[(1, 3)] = -dy;
        inv[(2, 3)] = -dz;
        Self {
            matrix: m,
            inverse: inv,
        }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    ///
    /// Returns `None` if any factor is zero.
    pub fn scale(sx: f32, sy: f32, sz: f32) -> Option<Self> {
        if sx == 0.0 || sy == 0.0 || sz == 0.0 {
            return None;
        }
        let m = Matrix4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz));
        let inv = Matrix4::new_nonuniform_scaling(&Vec3::new(1.0 / sx, 1.0 / sy, 1.0 / sz));
        Some(Self {
            matrix: m,
            inverse: inv,
        })
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self::rotation_from(m)
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self::rotation_from(m)
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self::rotation_from(m)
    }

    /// Rotation about an arbitrary axis through the origin by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula. The axis does not need to be normalized.
    pub fn rotation_about_axis(axis: &Vec3, angle: f32) -> Self {
        let a = axis.normalize();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (a.x, a.y, a.z);
        let mut m = Matrix4::identity();
        m[(0, 0)] = t * x * x + c;
        m[(0, 1)] = t * x * y - s * z;
        m[(0, 2)] = t * x * z + s * y;
        m[(1, 0)] = t * x * y + s * z;
        m[(1, 1)] = t * y * y + c;
        m[(1, 2)] = t * y * z - s * x;
        m[(2, 0)] = t * x * z - s * y;
        m[(2, 1)] = t * y * z + s * x;
        m[(2, 2)] = t * z * z + c;
        Self::rotation_from(m)
    }

    // Pure rotations invert by transposition.
    fn rotation_from(m: Matrix4<f32>) -> Self {
        Self {
            matrix: m,
            inverse: m.transpose(),
        }
    }

    /// Compose: `self` then `other` (self * other), i.e. `other` is applied first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
            inverse: other.inverse * self.inverse,
        }
    }

    /// The inverse transform.
    pub fn inverted(&self) -> Self {
        Self {
            matrix: self.inverse,
            inverse: self.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a normal vector (inverse transpose of the upper-left 3x3).
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let inv = self.inverse.fixed_view::<3, 3>(0, 0);
        inv.transpose() * n
    }

    /// Apply the inverse transform to a point.
    pub fn unapply_point(&self, p: &Point3) -> Point3 {
        self.inverted().apply_point(p)
    }

    /// Apply the inverse transform to a direction vector.
    pub fn unapply_vec(&self, v: &Vec3) -> Vec3 {
        self.inverted().apply_vec(v)
    }

    /// The top three rows of the forward matrix, row-major.
    pub fn affine_rows(&self) -> [f32; 12] {
        rows_of(&self.matrix)
    }

    /// The top three rows of the inverse matrix, row-major.
    pub fn inverse_affine_rows(&self) -> [f32; 12] {
        rows_of(&self.inverse)
    }

    /// Rebuild a transform from the forward and inverse affine rows written by
    /// [`Transform::affine_rows`] and [`Transform::inverse_affine_rows`].
    pub fn from_affine_rows(forward: &[f32], inverse: &[f32]) -> Self {
        Self {
            matrix: matrix_of(forward),
            inverse: matrix_of(inverse),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

fn rows_of(m: &Matrix4<f32>) -> [f32; 12] {
    let mut out = [0.0; 12];
    for r in 0..3 {
        for c in 0..4 {
            out[r * 4 + c] = m[(r, c)];
        }
    }
    out
}

fn matrix_of(rows: &[f32]) -> Matrix4<f32> {
    let mut m = Matrix4::identity();
    for r in 0..3 {
        for c in 0..4 {
            m[(r, c)] = rows[r * 4 + c];
        }
    }
    m
}

/// Azimuth of `(x, y)` in `[0, 2π)`.
#[inline]
pub fn azimuth(x: f32, y: f32) -> f32 {
    let phi = y.atan2(x);
    if phi < 0.0 {
        phi + 2.0 * std::f32::consts::PI
    } else {
        phi
    }
}
