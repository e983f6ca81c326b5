//! Orthonormal local frames.

use crate::Vec3;

/// A right-handed orthonormal basis `(s, t, n)` at a surface point.
///
/// `n` is the normal, `s` and `t` span the tangent plane with `s × t = n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// First tangent.
    pub s: Vec3,
    /// Second tangent.
    pub t: Vec3,
    /// Normal.
    pub n: Vec3,
}

impl Frame {
    /// Frame with an arbitrary tangent around a normal.
    ///
    /// The normal does not need to be normalized. Uses the branchless
    /// construction of Duff et al.
    pub fn from_normal(n: &Vec3) -> Self {
        let n = n.normalize();
        let sign = 1.0f32.copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        let s = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let t = Vec3::new(b, sign + n.y * n.y * a, -n.y);
        Self { s, t, n }
    }

    /// Frame around `n` whose first tangent is `tangent` projected onto the
    /// tangent plane.
    ///
    /// Falls back to [`Frame::from_normal`] when the tangent is (nearly)
    /// parallel to the normal or zero.
    pub fn from_normal_tangent(n: &Vec3, tangent: &Vec3) -> Self {
        let n = n.normalize();
        let projected = tangent - n * n.dot(tangent);
        let len2 = projected.norm_squared();
        if !(len2 > 1e-12) {
            return Self::from_normal(&n);
        }
        let s = projected / len2.sqrt();
        let t = n.cross(&s);
        Self { s, t, n }
    }

    /// Express a world vector in this frame's coordinates.
    pub fn to_local(&self, v: &Vec3) -> Vec3 {
        Vec3::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    /// Map frame coordinates back to world space.
    pub fn to_world(&self, v: &Vec3) -> Vec3 {
        self.s * v.x + self.t * v.y + self.n * v.z
    }
}
