//! Full surface-intersection records.

use flatray_math::{Frame, Point2, Point3};

/// Everything the shading layer needs about a ray/surface hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInteraction {
    /// Ray parameter of the hit.
    pub t: f32,
    /// World-space hit position.
    pub point: Point3,
    /// Basis derived from the raw geometry.
    pub geometric: Frame,
    /// Basis used for shading; interpolated for triangles, equal to
    /// `geometric` for analytic shapes.
    pub shading: Frame,
    /// Texture coordinates.
    pub uv: Point2,
}

impl SurfaceInteraction {
    /// Interaction whose shading frame is the geometric one.
    pub fn new(t: f32, point: Point3, geometric: Frame, uv: Point2) -> Self {
        Self {
            t,
            point,
            geometric,
            shading: geometric,
            uv,
        }
    }
}
