//! Cubic Bézier curves with varying width.

use flatray_math::{Aabb, Point3, Vec3};

use crate::error::{check_non_negative, GeomError, Result};

/// Cross-section of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    /// A flat strip that always faces the incoming ray.
    Flat,
    /// A strip oriented by normals interpolated between the end normals.
    Ribbon,
    /// A flat strip shaded as if it were a round tube.
    Cylinder,
}

/// One cubic Bézier segment of a (possibly longer) strand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    /// Bézier control points.
    pub control_points: [Point3; 4],
    /// Width at the segment start and end.
    pub widths: [f32; 2],
    /// Strand parameter at the segment start.
    pub u_min: f32,
    /// Strand parameter at the segment end.
    pub u_max: f32,
    /// Cross-section type.
    pub kind: CurveKind,
    /// Ribbon orientation at the two ends; unused for other kinds.
    pub normals: [Vec3; 2],
}

impl Curve {
    /// A single segment covering the strand parameter range `[0, 1]`.
    pub fn new(control_points: [Point3; 4], widths: [f32; 2], kind: CurveKind) -> Result<Self> {
        check_non_negative("width", widths[0])?;
        check_non_negative("width", widths[1])?;
        Ok(Self {
            control_points,
            widths,
            u_min: 0.0,
            u_max: 1.0,
            kind,
            normals: [Vec3::z(); 2],
        })
    }

    /// Set the ribbon end normals.
    pub fn with_normals(mut self, n0: Vec3, n1: Vec3) -> Result<Self> {
        let (l0, l1) = (n0.norm(), n1.norm());
        if !(l0 > 0.0 && l1 > 0.0) {
            return Err(GeomError::Degenerate("ribbon normal"));
        }
        self.normals = [n0 / l0, n1 / l1];
        Ok(self)
    }

    /// Split a piecewise cubic strand of `3n + 1` control points into `n`
    /// segments with contiguous parameter ranges.
    ///
    /// `widths` are the strand's start and end widths; each segment gets the
    /// linearly interpolated widths at its own ends.
    pub fn strand(points: &[Point3], widths: [f32; 2], kind: CurveKind) -> Result<Vec<Curve>> {
        if points.len() < 4 || (points.len() - 1) % 3 != 0 {
            return Err(GeomError::BadStrandLength(points.len()));
        }
        let n = (points.len() - 1) / 3;
        let width_at = |u: f32| widths[0] + (widths[1] - widths[0]) * u;
        (0..n)
            .map(|i| {
                let u_min = i as f32 / n as f32;
                let u_max = (i + 1) as f32 / n as f32;
                let cp = [0, 1, 2, 3].map(|k| points[3 * i + k]);
                let mut segment = Curve::new(cp, [width_at(u_min), width_at(u_max)], kind)?;
                segment.u_min = u_min;
                segment.u_max = u_max;
                Ok(segment)
            })
            .collect()
    }

    /// Width at local segment parameter `t` in `[0, 1]`.
    pub fn width_at(&self, t: f32) -> f32 {
        self.widths[0] + (self.widths[1] - self.widths[0]) * t
    }

    /// Strand parameter at local segment parameter `t`.
    pub fn strand_u(&self, t: f32) -> f32 {
        self.u_min + (self.u_max - self.u_min) * t
    }

    /// Point on the segment at local parameter `t`.
    pub fn eval(&self, t: f32) -> Point3 {
        eval_bezier(&self.control_points, t).0
    }

    /// Tangent `dP/dt` at local parameter `t`.
    pub fn derivative(&self, t: f32) -> Vec3 {
        eval_bezier(&self.control_points, t).1
    }

    /// World-space bounds: the control hull grown by half the widest width.
    pub fn bounds(&self) -> Aabb {
        let mut b = Aabb::from_points(self.control_points.iter());
        b.expand(0.5 * self.widths[0].max(self.widths[1]));
        b
    }

    /// Approximate area: control polygon length times the mean width.
    pub fn area(&self) -> f32 {
        let [p0, p1, p2, p3] = self.control_points;
        let len = (p1 - p0).norm() + (p2 - p1).norm() + (p3 - p2).norm();
        len * 0.5 * (self.widths[0] + self.widths[1])
    }
}

/// Evaluate a cubic Bézier and its derivative at `t` by de Casteljau.
///
/// When the derivative vanishes (coincident middle points) the chord
/// direction `cp[3] - cp[0]` is returned instead.
pub fn eval_bezier(cp: &[Point3; 4], t: f32) -> (Point3, Vec3) {
    let lerp = |a: &Point3, b: &Point3| Point3::from(a.coords.lerp(&b.coords, t));
    let a = [
        lerp(&cp[0], &cp[1]),
        lerp(&cp[1], &cp[2]),
        lerp(&cp[2], &cp[3]),
    ];
    let b = [lerp(&a[0], &a[1]), lerp(&a[1], &a[2])];
    let d = if (b[1] - b[0]).norm_squared() > 0.0 {
        (b[1] - b[0]) * 3.0
    } else {
        cp[3] - cp[0]
    };
    (lerp(&b[0], &b[1]), d)
}

/// Split a cubic Bézier at `t = 0.5` into two halves sharing a middle point.
///
/// The halves are `out[0..4]` and `out[3..7]`.
pub fn subdivide_bezier(cp: &[Point3; 4]) -> [Point3; 7] {
    let [p0, p1, p2, p3] = cp.map(|p| p.coords);
    [
        cp[0],
        Point3::from((p0 + p1) * 0.5),
        Point3::from((p0 + p1 * 2.0 + p2) * 0.25),
        Point3::from((p0 + p1 * 3.0 + p2 * 3.0 + p3) * 0.125),
        Point3::from((p1 + p2 * 2.0 + p3) * 0.25),
        Point3::from((p2 + p3) * 0.5),
        cp[3],
    ]
}
