//! Scene compiler: turns a [`Scene`] into flat, offset-addressed arrays.
//!
//! The output, [`FlatScene`], holds no pointers. Every top-level primitive is
//! addressed by a [`PackedRef`] (`kind:16, offset:16`) into its kind's
//! fixed-stride `f32` table; meshes add a shared triangle table and a shared
//! `i32` BVH buffer in the threaded layout described in [`flatten`]; all
//! bounding boxes live in one deduplicated table. Every array can be viewed
//! as bytes for upload to another address space.

pub mod flatten;
pub mod record;

use bytemuck::{Pod, Zeroable};
use flatray_geom::{
    Cone, Curve, Cylinder, Disk, Hyperboloid, PackedRef, Paraboloid, Plane, Rectangle,
    RectangularCuboid, ShapeKind, Sphere, Torus, Triangle,
};
use flatray_math::Point3;
use log::{debug, info};

use crate::bvh::Bvh;
use crate::config::CompileOptions;
use crate::error::{CompileError, Result};
use crate::mesh::TriangleMesh;
use crate::scene::{Scene, Shape};

pub use flatten::{FlatAabb, END, LEAF_ALIGNMENT, TAG_INTERNAL, TAG_LEAF};
pub use record::{FlatRecord, PolygonRecord};

use flatten::{word, BoundsTable, BvhFlattener};

/// Most instances a single per-kind table may hold.
pub const MAX_TABLE_LEN: usize = PackedRef::MAX_OFFSET;

/// A compiled mesh.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshRecord {
    /// Start of the mesh's records in the BVH buffer, or [`END`] if the mesh
    /// is tested triangle by triangle.
    pub bvh_base: i32,
    /// First triangle in the shared mesh-triangle table.
    pub first_triangle: u32,
    /// Number of triangles.
    pub triangle_count: u32,
    /// Index of the mesh bounds in the bounds table.
    pub bounds: u32,
    /// Summed triangle area.
    pub area: f32,
}

/// One top-level primitive, in scene order.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct PrimitiveEntry {
    /// Raw [`PackedRef`] of the primitive.
    pub primitive: u32,
    /// Index of its bounds in the bounds table.
    pub bounds: u32,
}

impl PrimitiveEntry {
    /// The primitive reference.
    pub fn reference(&self) -> PackedRef {
        PackedRef::from_raw(self.primitive)
    }
}

/// Records and material words of one primitive kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveTable {
    stride: usize,
    words: Vec<f32>,
    materials: Vec<u32>,
}

impl PrimitiveTable {
    fn new(stride: usize) -> Self {
        Self {
            stride,
            ..Self::default()
        }
    }

    fn push<R: FlatRecord>(&mut self, record: &R, material: PackedRef) {
        record.write(&mut self.words);
        self.materials.push(material.raw());
    }

    /// Words per record (0 for meshes, whose records live elsewhere).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Words of instance `offset`.
    pub fn record(&self, offset: usize) -> Option<&[f32]> {
        let start = offset.checked_mul(self.stride)?;
        self.words.get(start..start + self.stride)
    }

    /// All record words.
    pub fn words(&self) -> &[f32] {
        &self.words
    }

    /// Material word of instance `offset`.
    pub fn material(&self, offset: usize) -> Option<PackedRef> {
        self.materials.get(offset).copied().map(PackedRef::from_raw)
    }

    /// All material words.
    pub fn materials(&self) -> &[u32] {
        &self.materials
    }
}

fn stride_of(kind: ShapeKind) -> usize {
    match kind {
        ShapeKind::Plane => Plane::STRIDE,
        ShapeKind::Sphere => Sphere::STRIDE,
        ShapeKind::Disk => Disk::STRIDE,
        ShapeKind::Cone => Cone::STRIDE,
        ShapeKind::Cylinder => Cylinder::STRIDE,
        ShapeKind::Hyperboloid => Hyperboloid::STRIDE,
        ShapeKind::Paraboloid => Paraboloid::STRIDE,
        ShapeKind::Polygon => PolygonRecord::STRIDE,
        ShapeKind::Rectangle => Rectangle::STRIDE,
        ShapeKind::RectangularCuboid => RectangularCuboid::STRIDE,
        ShapeKind::Torus => Torus::STRIDE,
        ShapeKind::Triangle => Triangle::STRIDE,
        ShapeKind::Curve => Curve::STRIDE,
        ShapeKind::Mesh => 0,
    }
}

/// A compiled scene: flat tables addressed by offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatScene {
    tables: Vec<PrimitiveTable>,
    polygon_vertices: Vec<Point3>,
    mesh_triangles: Vec<f32>,
    meshes: Vec<MeshRecord>,
    bvh: Vec<i32>,
    bounds: Vec<FlatAabb>,
    primitives: Vec<PrimitiveEntry>,
}

impl FlatScene {
    /// Table of one primitive kind.
    pub fn table(&self, kind: ShapeKind) -> &PrimitiveTable {
        &self.tables[kind.id() as usize]
    }

    /// Top-level primitives in scene order.
    pub fn primitives(&self) -> &[PrimitiveEntry] {
        &self.primitives
    }

    /// Deduplicated bounds table.
    pub fn bounds(&self) -> &[FlatAabb] {
        &self.bounds
    }

    /// Shared BVH word buffer.
    pub fn bvh_words(&self) -> &[i32] {
        &self.bvh
    }

    /// Compiled meshes.
    pub fn meshes(&self) -> &[MeshRecord] {
        &self.meshes
    }

    /// Shared polygon vertex pool.
    pub fn polygon_vertices(&self) -> &[Point3] {
        &self.polygon_vertices
    }

    /// Vertices of a compiled polygon, if its range is in the pool.
    pub fn polygon(&self, record: &PolygonRecord) -> Option<&[Point3]> {
        let start = record.first_vertex as usize;
        let end = start + record.vertex_count as usize;
        self.polygon_vertices.get(start..end)
    }

    /// Words of the shared mesh-triangle table.
    pub fn mesh_triangle_words(&self) -> &[f32] {
        &self.mesh_triangles
    }

    /// Number of triangles across all meshes.
    pub fn mesh_triangle_count(&self) -> usize {
        self.mesh_triangles.len() / Triangle::STRIDE
    }

    /// Decode triangle `index` of the shared mesh-triangle table.
    pub fn mesh_triangle(&self, index: usize) -> Option<Triangle> {
        let start = index.checked_mul(Triangle::STRIDE)?;
        self.mesh_triangles
            .get(start..start + Triangle::STRIDE)
            .map(Triangle::read)
    }

    /// Material word attached to `primitive`.
    pub fn material(&self, primitive: PackedRef) -> Option<PackedRef> {
        let table = self.table(primitive.kind()?);
        table.material(primitive.offset() as usize)
    }

    /// Every top-level primitive reference, in scene order.
    pub fn references(&self) -> impl Iterator<Item = PackedRef> + '_ {
        self.primitives.iter().map(PrimitiveEntry::reference)
    }

    /// BVH buffer as bytes.
    pub fn bvh_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bvh)
    }

    /// Bounds table as bytes.
    pub fn bounds_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bounds)
    }

    /// Mesh records as bytes.
    pub fn mesh_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.meshes)
    }

    /// Shared mesh-triangle table as bytes.
    pub fn mesh_triangle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.mesh_triangles)
    }

    /// Polygon vertex pool as bytes.
    pub fn polygon_vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.polygon_vertices)
    }

    /// Top-level primitive list as bytes.
    pub fn primitive_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.primitives)
    }

    /// Record words of one kind as bytes.
    pub fn table_bytes(&self, kind: ShapeKind) -> &[u8] {
        bytemuck::cast_slice(self.table(kind).words())
    }

    /// Material words of one kind as bytes.
    pub fn material_bytes(&self, kind: ShapeKind) -> &[u8] {
        bytemuck::cast_slice(self.table(kind).materials())
    }
}

/// Compiles [`Scene`]s into [`FlatScene`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneCompiler {
    options: CompileOptions,
}

impl SceneCompiler {
    /// Compiler with the given options.
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `scene`.
    ///
    /// Fails without writing anything partial if any kind has more than
    /// [`MAX_TABLE_LEN`] instances or a shared buffer outgrows its offsets.
    pub fn compile(&self, scene: &Scene) -> Result<FlatScene> {
        let mut counts = [0usize; ShapeKind::COUNT];
        for object in scene.objects() {
            counts[object.shape.kind().id() as usize] += 1;
        }
        for kind in ShapeKind::ALL {
            let count = counts[kind.id() as usize];
            if count > MAX_TABLE_LEN {
                return Err(CompileError::TableOverflow {
                    kind,
                    count,
                    max: MAX_TABLE_LEN,
                });
            }
        }

        let mut builder = Builder {
            tables: ShapeKind::ALL
                .iter()
                .map(|&k| PrimitiveTable::new(stride_of(k)))
                .collect(),
            polygon_vertices: Vec::new(),
            mesh_triangles: Vec::new(),
            meshes: Vec::new(),
            bvh: Vec::new(),
            bounds: BoundsTable::default(),
            primitives: Vec::with_capacity(scene.len()),
            options: &self.options,
        };
        for object in scene.objects() {
            builder.add(&object.shape, object.material)?;
        }
        let flat = builder.finish();

        info!(
            "compiled {} primitives: {} meshes, {} mesh triangles, {} BVH words, {} bounds",
            flat.primitives.len(),
            flat.meshes.len(),
            flat.mesh_triangle_count(),
            flat.bvh.len(),
            flat.bounds.len()
        );
        Ok(flat)
    }
}

struct Builder<'a> {
    tables: Vec<PrimitiveTable>,
    polygon_vertices: Vec<Point3>,
    mesh_triangles: Vec<f32>,
    meshes: Vec<MeshRecord>,
    bvh: Vec<i32>,
    bounds: BoundsTable,
    primitives: Vec<PrimitiveEntry>,
    options: &'a CompileOptions,
}

impl Builder<'_> {
    fn add(&mut self, shape: &Shape, material: PackedRef) -> Result<()> {
        let kind = shape.kind();
        let table = &mut self.tables[kind.id() as usize];
        let offset = table.len();

        match shape {
            Shape::Plane(s) => table.push(s, material),
            Shape::Sphere(s) => table.push(s, material),
            Shape::Disk(s) => table.push(s, material),
            Shape::Cone(s) => table.push(s, material),
            Shape::Cylinder(s) => table.push(s, material),
            Shape::Hyperboloid(s) => table.push(s, material),
            Shape::Paraboloid(s) => table.push(s, material),
            Shape::Rectangle(s) => table.push(s, material),
            Shape::RectangularCuboid(s) => table.push(s, material),
            Shape::Torus(s) => table.push(s, material),
            Shape::Triangle(s) => table.push(s, material),
            Shape::Curve(s) => table.push(s, material),
            Shape::Polygon(poly) => {
                let first = self.polygon_vertices.len();
                let end = first + poly.vertices.len();
                if end > PolygonRecord::MAX_POOL_LEN {
                    return Err(CompileError::VertexPoolOverflow(end));
                }
                self.polygon_vertices.extend_from_slice(&poly.vertices);
                let record = PolygonRecord {
                    first_vertex: first as u32,
                    vertex_count: poly.vertices.len() as u32,
                    normal: poly.normal,
                };
                table.push(&record, material);
            }
            Shape::Mesh(mesh) => {
                table.materials.push(material.raw());
                self.add_mesh(mesh)?;
            }
        }

        let overflow = CompileError::TableOverflow {
            kind,
            count: offset + 1,
            max: MAX_TABLE_LEN,
        };
        let primitive = PackedRef::try_new(kind.id(), offset).ok_or(overflow)?;
        let bounds = self.bounds.insert(&shape.bounds());
        self.primitives.push(PrimitiveEntry {
            primitive: primitive.raw(),
            bounds,
        });
        Ok(())
    }

    fn add_mesh(&mut self, mesh: &TriangleMesh) -> Result<()> {
        let first_triangle = self.mesh_triangles.len() / Triangle::STRIDE;
        let end = first_triangle + mesh.len();
        if i32::try_from(end).is_err() {
            return Err(CompileError::BvhOverflow(end));
        }
        for tri in mesh.triangles() {
            tri.write(&mut self.mesh_triangles);
        }

        let bvh_base = if self.options.accelerate_meshes {
            let built;
            let bvh = match mesh.bvh() {
                Some(bvh) => bvh,
                None => {
                    built = Bvh::build(mesh.triangles(), &self.options.bvh);
                    &built
                }
            };
            let base = BvhFlattener::new(bvh, first_triangle, &mut self.bounds, &mut self.bvh)
                .flatten()?;
            match base {
                Some(base) => word(base)?,
                None => END,
            }
        } else {
            END
        };

        let record = MeshRecord {
            bvh_base,
            first_triangle: first_triangle as u32,
            triangle_count: mesh.len() as u32,
            bounds: self.bounds.insert(&mesh.bounds()),
            area: mesh.area(),
        };
        debug!(
            "flattened mesh {}: {} triangles from {}, BVH base {}, {} BVH words so far",
            self.meshes.len(),
            record.triangle_count,
            record.first_triangle,
            record.bvh_base,
            self.bvh.len()
        );
        self.meshes.push(record);
        Ok(())
    }

    fn finish(self) -> FlatScene {
        FlatScene {
            tables: self.tables,
            polygon_vertices: self.polygon_vertices,
            mesh_triangles: self.mesh_triangles,
            meshes: self.meshes,
            bvh: self.bvh,
            bounds: self.bounds.into_boxes(),
            primitives: self.primitives,
        }
    }
}
