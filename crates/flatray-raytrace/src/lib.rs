#![warn(missing_docs)]

//! Ray intersection over flat, offset-addressed scene arrays.
//!
//! This crate intersects rays with analytic primitives (quadrics, torus,
//! planar shapes), triangles, Bézier curves and BVH-accelerated triangle
//! meshes. Scenes are compiled once into plain arrays of `f32`/`i32` words
//! with 32-bit packed references instead of pointers, so the same data can
//! be walked here or uploaded elsewhere byte for byte.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray with un-normalized direction and cached reciprocal
//! - [`intersect`] - One module of pure intersection routines per primitive kind
//! - [`bvh`] - SAH construction over a triangle list
//! - [`TriangleMesh`], [`Scene`] - Scene description
//! - [`compile`] - Flattening a scene into a [`FlatScene`]
//! - [`Kernel`] - Stackless queries against a [`FlatScene`]
//! - [`config`] - TOML-loadable options
//!
//! # Example
//!
//! ```
//! use flatray_geom::{PackedRef, Sphere};
//! use flatray_math::{Point3, Vec3};
//! use flatray_raytrace::{Kernel, KernelOptions, Ray, Scene, SceneCompiler};
//!
//! let mut scene = Scene::new();
//! scene.add(Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0).unwrap(), PackedRef::default());
//! let flat = SceneCompiler::default().compile(&scene).unwrap();
//!
//! let kernel = Kernel::new(&flat, KernelOptions::default());
//! let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, 1.0));
//! let hit = kernel.nearest(&ray, 0.0, f32::INFINITY).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-5);
//! ```

mod ray;
pub mod bvh;
pub mod compile;
pub mod config;
pub mod error;
pub mod intersect;
pub mod kernel;
pub mod mesh;
pub mod scene;

pub use bvh::{Bvh, BvhOptions};
pub use compile::{FlatScene, SceneCompiler};
pub use config::{CompileOptions, CoreConfig, KernelOptions};
pub use error::{CompileError, ConfigError};
pub use intersect::QuarticPrecision;
pub use kernel::{Hit, Kernel};
pub use mesh::TriangleMesh;
pub use ray::Ray;
pub use scene::{Scene, SceneObject, Shape};
