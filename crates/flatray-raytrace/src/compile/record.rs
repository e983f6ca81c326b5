//! Fixed-stride `f32` encodings of primitive parameter records.
//!
//! Each kind has a flat table of `STRIDE`-word records. Transforms are
//! stored as the top three rows of the forward matrix followed by those of
//! the inverse, so decoding never inverts anything. Integer fields (vertex
//! pool ranges, curve kinds) are stored as exactly representable `f32`
//! values.

use flatray_geom::{
    Cone, Curve, CurveKind, Cylinder, Disk, Hyperboloid, Paraboloid, Plane, Rectangle,
    RectangularCuboid, Sphere, Torus, Triangle,
};
use flatray_math::{Point2, Point3, Transform, Vec3};

/// A record stored as `STRIDE` consecutive words of a primitive table.
pub trait FlatRecord: Sized {
    /// Words per record.
    const STRIDE: usize;

    /// Append exactly `STRIDE` words.
    fn write(&self, out: &mut Vec<f32>);

    /// Decode from a slice of at least `STRIDE` words.
    fn read(words: &[f32]) -> Self;
}

/// Words taken by an encoded transform.
const TRANSFORM_WORDS: usize = 24;

fn write_transform(t: &Transform, out: &mut Vec<f32>) {
    out.extend_from_slice(&t.affine_rows());
    out.extend_from_slice(&t.inverse_affine_rows());
}

fn read_transform(w: &[f32]) -> Transform {
    Transform::from_affine_rows(&w[0..12], &w[12..24])
}

fn write_point(p: &Point3, out: &mut Vec<f32>) {
    out.extend_from_slice(&[p.x, p.y, p.z]);
}

fn write_vec(v: &Vec3, out: &mut Vec<f32>) {
    out.extend_from_slice(&[v.x, v.y, v.z]);
}

fn read_point(w: &[f32]) -> Point3 {
    Point3::new(w[0], w[1], w[2])
}

fn read_vec(w: &[f32]) -> Vec3 {
    Vec3::new(w[0], w[1], w[2])
}

impl FlatRecord for Plane {
    const STRIDE: usize = 6;

    fn write(&self, out: &mut Vec<f32>) {
        write_point(&self.point, out);
        write_vec(&self.normal, out);
    }

    fn read(w: &[f32]) -> Self {
        Self {
            point: read_point(&w[0..]),
            normal: read_vec(&w[3..]),
        }
    }
}

impl FlatRecord for Sphere {
    const STRIDE: usize = TRANSFORM_WORDS + 3;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.z_min, self.z_max, self.phi_max]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            z_min: p[0],
            z_max: p[1],
            phi_max: p[2],
        }
    }
}

impl FlatRecord for Disk {
    const STRIDE: usize = TRANSFORM_WORDS + 4;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.height, self.radius, self.inner_radius, self.phi_max]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            height: p[0],
            radius: p[1],
            inner_radius: p[2],
            phi_max: p[3],
        }
    }
}

impl FlatRecord for Cylinder {
    const STRIDE: usize = TRANSFORM_WORDS + 4;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.radius, self.z_min, self.z_max, self.phi_max]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            radius: p[0],
            z_min: p[1],
            z_max: p[2],
            phi_max: p[3],
        }
    }
}

impl FlatRecord for Cone {
    const STRIDE: usize = TRANSFORM_WORDS + 3;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.radius, self.height, self.phi_max]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            radius: p[0],
            height: p[1],
            phi_max: p[2],
        }
    }
}

impl FlatRecord for Hyperboloid {
    const STRIDE: usize = TRANSFORM_WORDS + 5;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.a_h, self.c_h, self.z_min, self.z_max, self.phi_max]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            a_h: p[0],
            c_h: p[1],
            z_min: p[2],
            z_max: p[3],
            phi_max: p[4],
        }
    }
}

impl FlatRecord for Paraboloid {
    const STRIDE: usize = TRANSFORM_WORDS + 4;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.radius, self.z_min, self.z_max, self.phi_max]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            radius: p[0],
            z_min: p[1],
            z_max: p[2],
            phi_max: p[3],
        }
    }
}

impl FlatRecord for Torus {
    const STRIDE: usize = TRANSFORM_WORDS + 2;

    fn write(&self, out: &mut Vec<f32>) {
        write_transform(&self.object_to_world, out);
        out.extend_from_slice(&[self.major_radius, self.minor_radius]);
    }

    fn read(w: &[f32]) -> Self {
        let p = &w[TRANSFORM_WORDS..];
        Self {
            object_to_world: read_transform(w),
            major_radius: p[0],
            minor_radius: p[1],
        }
    }
}

impl FlatRecord for Rectangle {
    const STRIDE: usize = 9;

    fn write(&self, out: &mut Vec<f32>) {
        write_point(&self.corner, out);
        write_vec(&self.side_u, out);
        write_vec(&self.side_v, out);
    }

    fn read(w: &[f32]) -> Self {
        Self {
            corner: read_point(&w[0..]),
            side_u: read_vec(&w[3..]),
            side_v: read_vec(&w[6..]),
        }
    }
}

impl FlatRecord for RectangularCuboid {
    const STRIDE: usize = 6;

    fn write(&self, out: &mut Vec<f32>) {
        write_point(&self.min, out);
        write_point(&self.max, out);
    }

    fn read(w: &[f32]) -> Self {
        Self {
            min: read_point(&w[0..]),
            max: read_point(&w[3..]),
        }
    }
}

impl FlatRecord for Triangle {
    /// Positions, normals, tangents (9 words each), then uvs (6).
    const STRIDE: usize = 33;

    fn write(&self, out: &mut Vec<f32>) {
        self.positions.iter().for_each(|p| write_point(p, out));
        self.normals.iter().for_each(|n| write_vec(n, out));
        self.tangents.iter().for_each(|t| write_vec(t, out));
        for uv in &self.uvs {
            out.extend_from_slice(&[uv.x, uv.y]);
        }
    }

    fn read(w: &[f32]) -> Self {
        let vec3 = |base: usize| [0, 3, 6].map(|k| read_vec(&w[base + k..]));
        Self {
            positions: [0, 3, 6].map(|k| read_point(&w[k..])),
            normals: vec3(9),
            tangents: vec3(18),
            uvs: [
                Point2::new(w[27], w[28]),
                Point2::new(w[29], w[30]),
                Point2::new(w[31], w[32]),
            ],
        }
    }
}

fn curve_kind_word(kind: CurveKind) -> f32 {
    match kind {
        CurveKind::Flat => 0.0,
        CurveKind::Ribbon => 1.0,
        CurveKind::Cylinder => 2.0,
    }
}

fn curve_kind_from_word(word: f32) -> CurveKind {
    match word as u32 {
        1 => CurveKind::Ribbon,
        2 => CurveKind::Cylinder,
        _ => CurveKind::Flat,
    }
}

impl FlatRecord for Curve {
    /// Control points (12), widths (2), u range (2), kind (1), normals (6).
    const STRIDE: usize = 23;

    fn write(&self, out: &mut Vec<f32>) {
        self.control_points.iter().for_each(|p| write_point(p, out));
        out.extend_from_slice(&self.widths);
        out.extend_from_slice(&[self.u_min, self.u_max, curve_kind_word(self.kind)]);
        self.normals.iter().for_each(|n| write_vec(n, out));
    }

    fn read(w: &[f32]) -> Self {
        Self {
            control_points: [
                read_point(&w[0..]),
                read_point(&w[3..]),
                read_point(&w[6..]),
                read_point(&w[9..]),
            ],
            widths: [w[12], w[13]],
            u_min: w[14],
            u_max: w[15],
            kind: curve_kind_from_word(w[16]),
            normals: [read_vec(&w[17..]), read_vec(&w[20..])],
        }
    }
}

/// A compiled polygon: a range of the shared vertex pool plus its normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonRecord {
    /// First vertex in the pool.
    pub first_vertex: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Unit normal.
    pub normal: Vec3,
}

impl PolygonRecord {
    /// Largest pool index stored exactly in an `f32` word.
    pub const MAX_POOL_LEN: usize = 1 << 24;
}

impl FlatRecord for PolygonRecord {
    const STRIDE: usize = 5;

    fn write(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(&[self.first_vertex as f32, self.vertex_count as f32]);
        write_vec(&self.normal, out);
    }

    fn read(w: &[f32]) -> Self {
        Self {
            first_vertex: w[0] as u32,
            vertex_count: w[1] as u32,
            normal: read_vec(&w[2..]),
        }
    }
}
