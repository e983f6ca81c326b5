#![warn(missing_docs)]

//! Primitive parameter records for the flatray intersection core.
//!
//! Every primitive kind the kernel understands is a small, immutable record
//! of scalars: quadrics and the torus live in a canonical object frame with
//! an object-to-world [`Transform`](flatray_math::Transform), planar shapes,
//! triangles and curves are stored directly in world space.
//!
//! The records carry no behaviour beyond validation, bounds and area. Ray
//! intersection lives in `flatray-raytrace`, which dispatches on
//! [`ShapeKind`] rather than through a trait object.

mod curve;
mod error;
mod interaction;
mod kind;
mod planar;
mod quadric;
mod triangle;

pub use curve::{eval_bezier, subdivide_bezier, Curve, CurveKind};
pub use error::{GeomError, Result};
pub use interaction::SurfaceInteraction;
pub use kind::{PackedRef, ShapeKind};
pub use planar::{dominant_axis, Plane, Polygon, Rectangle, RectangularCuboid};
pub use quadric::{Cone, Cylinder, Disk, Hyperboloid, Paraboloid, Sphere, Torus};
pub use triangle::Triangle;
