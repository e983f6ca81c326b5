//! Triangle meshes with an optional BVH.

use flatray_geom::Triangle;
use flatray_math::{Aabb, Point3};
use log::warn;

use crate::bvh::{Bvh, BvhOptions};
use crate::config::CompileOptions;
use crate::error::{CompileError, Result};
use crate::intersect::triangle::{self, TriangleHit};
use crate::Ray;

/// A triangle list, optionally accelerated by one BVH.
///
/// Without a BVH the mesh keeps only its bounding box and is searched
/// triangle by triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
    bvh: Option<Bvh>,
    bounds: Aabb,
    area: f32,
}

impl TriangleMesh {
    /// Mesh without acceleration.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        warn_degenerate(&triangles);
        let bounds = triangles
            .iter()
            .fold(Aabb::empty(), |b, t| b.union(&t.bounds()));
        let area = triangles.iter().map(Triangle::area).sum();
        Self {
            triangles,
            bvh: None,
            bounds,
            area,
        }
    }

    /// Mesh with a BVH built by `options`.
    pub fn accelerated(triangles: Vec<Triangle>, options: &BvhOptions) -> Self {
        warn_degenerate(&triangles);
        let bvh = Bvh::build(&triangles, options);
        Self {
            bounds: bvh.bounds(),
            area: bvh.area(),
            bvh: Some(bvh),
            triangles,
        }
    }

    /// Mesh accelerated or not according to `options`.
    pub fn with_options(triangles: Vec<Triangle>, options: &CompileOptions) -> Self {
        if options.accelerate_meshes {
            Self::accelerated(triangles, &options.bvh)
        } else {
            Self::new(triangles)
        }
    }

    /// Mesh from an indexed vertex list, without shading data.
    pub fn from_indexed(
        positions: &[Point3],
        faces: &[[u32; 3]],
        options: &CompileOptions,
    ) -> Result<Self> {
        let vertex = |face: usize, index: u32| {
            positions
                .get(index as usize)
                .copied()
                .ok_or(CompileError::VertexIndex {
                    face,
                    index,
                    vertex_count: positions.len(),
                })
        };
        let triangles = faces
            .iter()
            .enumerate()
            .map(|(i, &[a, b, c])| Ok(Triangle::new(vertex(i, a)?, vertex(i, b)?, vertex(i, c)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_options(triangles, options))
    }

    /// The triangles, in the order the BVH indexes them.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The BVH, if the mesh is accelerated.
    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Summed triangle area.
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Nearest triangle hit in `(t_min, t_max)`, through the BVH when there
    /// is one.
    pub fn nearest_hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<(u32, TriangleHit)> {
        match &self.bvh {
            Some(bvh) => bvh.nearest_hit(&self.triangles, ray, t_min, t_max),
            None => {
                ray.intersect_aabb(&self.bounds, t_min, t_max)?;
                self.brute_force_hit(ray, t_min, t_max)
            }
        }
    }

    /// Nearest triangle hit testing every triangle.
    pub fn brute_force_hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<(u32, TriangleHit)> {
        let mut best = None;
        let mut closest = t_max;
        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(hit) = triangle::intersection_t(ray, tri, t_min, closest) {
                closest = hit.t;
                best = Some((i as u32, hit));
            }
        }
        best
    }
}

fn warn_degenerate(triangles: &[Triangle]) {
    let degenerate = triangles.iter().filter(|t| t.is_degenerate()).count();
    if degenerate > 0 {
        warn!(
            "mesh has {} degenerate triangle(s) out of {}; they will never be hit",
            degenerate,
            triangles.len()
        );
    }
}
