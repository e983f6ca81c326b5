//! Shape kinds and the packed `(type:16, offset:16)` reference word.

use std::fmt;

/// The closed set of primitive kinds the kernel can intersect.
///
/// The discriminant doubles as the type id in a [`PackedRef`].
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    /// Infinite plane.
    Plane = 0,
    /// Partial sphere.
    Sphere = 1,
    /// Disk or annulus.
    Disk = 2,
    /// Cone.
    Cone = 3,
    /// Cylinder.
    Cylinder = 4,
    /// Hyperboloid of one sheet.
    Hyperboloid = 5,
    /// Paraboloid.
    Paraboloid = 6,
    /// Planar polygon.
    Polygon = 7,
    /// Parallelogram.
    Rectangle = 8,
    /// Axis-aligned box.
    RectangularCuboid = 9,
    /// Torus.
    Torus = 10,
    /// Stand-alone triangle.
    Triangle = 11,
    /// Cubic Bézier curve segment.
    Curve = 12,
    /// Triangle mesh (BVH-accelerated or brute force).
    Mesh = 13,
}

impl ShapeKind {
    /// Number of kinds.
    pub const COUNT: usize = 14;

    /// All kinds in discriminant order.
    pub const ALL: [ShapeKind; Self::COUNT] = [
        ShapeKind::Plane,
        ShapeKind::Sphere,
        ShapeKind::Disk,
        ShapeKind::Cone,
        ShapeKind::Cylinder,
        ShapeKind::Hyperboloid,
        ShapeKind::Paraboloid,
        ShapeKind::Polygon,
        ShapeKind::Rectangle,
        ShapeKind::RectangularCuboid,
        ShapeKind::Torus,
        ShapeKind::Triangle,
        ShapeKind::Curve,
        ShapeKind::Mesh,
    ];

    /// The kind with type id `id`, if any.
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// The type id stored in a [`PackedRef`].
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Plane => "plane",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Disk => "disk",
            ShapeKind::Cone => "cone",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Hyperboloid => "hyperboloid",
            ShapeKind::Paraboloid => "paraboloid",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::RectangularCuboid => "rectangular cuboid",
            ShapeKind::Torus => "torus",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Curve => "curve",
            ShapeKind::Mesh => "mesh",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 32-bit word addressing one entry of an offset-addressed table:
/// the high 16 bits hold a type id, the low 16 bits an offset.
///
/// Used for primitives (`type = ShapeKind`) and, opaquely, for the material
/// or texture resource attached to each compiled primitive.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PackedRef(u32);

impl PackedRef {
    /// Largest offset a packed word can address.
    pub const MAX_OFFSET: usize = u16::MAX as usize;

    /// Pack a type id and offset.
    pub const fn new(type_id: u16, offset: u16) -> Self {
        Self(((type_id as u32) << 16) | offset as u32)
    }

    /// Pack a type id and a table offset, or `None` if the offset does not
    /// fit in 16 bits.
    pub fn try_new(type_id: u16, offset: usize) -> Option<Self> {
        u16::try_from(offset).ok().map(|o| Self::new(type_id, o))
    }

    /// Reference to instance `offset` of a primitive table.
    pub fn primitive(kind: ShapeKind, offset: u16) -> Self {
        Self::new(kind.id(), offset)
    }

    /// Reinterpret a raw word.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit word.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// High 16 bits.
    pub const fn type_id(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Low 16 bits.
    pub const fn offset(self) -> u16 {
        self.0 as u16
    }

    /// The primitive kind, if the type id names one.
    pub fn kind(self) -> Option<ShapeKind> {
        ShapeKind::from_id(self.type_id())
    }
}

impl fmt::Display for PackedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{}#{}", kind, self.offset()),
            None => write!(f, "{}#{}", self.type_id(), self.offset()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let r = PackedRef::new(0xBEEF, 0x1234);
        assert_eq!(r.raw(), 0xBEEF_1234);
        assert_eq!(r.type_id(), 0xBEEF);
        assert_eq!(r.offset(), 0x1234);
        assert_eq!(PackedRef::from_raw(r.raw()), r);
    }

    #[test]
    fn test_offset_overflow_is_rejected() {
        assert!(PackedRef::try_new(1, PackedRef::MAX_OFFSET).is_some());
        assert!(PackedRef::try_new(1, PackedRef::MAX_OFFSET + 1).is_none());
    }

    #[test]
    fn test_kind_ids_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_id(kind.id()), Some(kind));
            assert_eq!(PackedRef::primitive(kind, 7).kind(), Some(kind));
        }
        assert_eq!(ShapeKind::from_id(ShapeKind::COUNT as u16), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PackedRef::primitive(ShapeKind::Sphere, 3).to_string(),
            "sphere#3"
        );
        assert_eq!(PackedRef::new(999, 1).to_string(), "999#1");
    }
}
