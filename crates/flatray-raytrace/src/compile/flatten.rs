//! Threaded BVH records and the deduplicated bounds table.
//!
//! A mesh BVH is written as a pre-order run of `i32` records:
//!
//! ```text
//! internal: [TAG_INTERNAL, bounds, next, left]
//! leaf:     [TAG_LEAF, bounds, next, count, tri_0, .., tri_{count-1}, -1 padding]
//! ```
//!
//! Offsets are relative to the start of the mesh's run. `next` is the
//! offset of the first later record whose depth is at most this record's
//! depth, i.e. the first record outside this subtree, or [`END`]. A walker
//! that rejects a node jumps to `next`; one that accepts an internal node
//! moves to `left`. No stack is needed.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use flatray_math::{Aabb, Point3};

use crate::bvh::{Bvh, BvhNodeKind};
use crate::error::{CompileError, Result};

/// Tag word of an internal record.
pub const TAG_INTERNAL: i32 = 0;
/// Tag word of a leaf record.
pub const TAG_LEAF: i32 = 1;
/// Terminal `next` offset.
pub const END: i32 = -1;
/// Words in an internal record.
pub const INTERNAL_WORDS: usize = 4;
/// Header words of a leaf record.
pub const LEAF_HEADER_WORDS: usize = 4;
/// Leaf records are padded to a multiple of this many words.
pub const LEAF_ALIGNMENT: usize = 4;

/// Words taken by a leaf holding `count` triangles.
pub fn leaf_words(count: usize) -> usize {
    (LEAF_HEADER_WORDS + count).div_ceil(LEAF_ALIGNMENT) * LEAF_ALIGNMENT
}

/// Size of the record starting at `header`, from its first four words.
pub fn record_words(header: &[i32]) -> usize {
    if header[0] == TAG_LEAF {
        leaf_words(header[3].max(0) as usize)
    } else {
        INTERNAL_WORDS
    }
}

/// A bounding box as stored in the flat bounds table.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FlatAabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl FlatAabb {
    /// Back to an [`Aabb`].
    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(Point3::from(self.min), Point3::from(self.max))
    }

    fn key(&self) -> [u32; 6] {
        let [a, b, c] = self.min;
        let [d, e, f] = self.max;
        [a, b, c, d, e, f].map(f32::to_bits)
    }
}

impl From<&Aabb> for FlatAabb {
    fn from(aabb: &Aabb) -> Self {
        Self {
            min: aabb.min.coords.into(),
            max: aabb.max.coords.into(),
        }
    }
}

/// Bounds table that stores each bit-identical box once.
#[derive(Debug, Default)]
pub(crate) struct BoundsTable {
    boxes: Vec<FlatAabb>,
    index: HashMap<[u32; 6], u32>,
}

impl BoundsTable {
    /// Index of `aabb`, appending it if this exact box is new.
    pub fn insert(&mut self, aabb: &Aabb) -> u32 {
        let flat = FlatAabb::from(aabb);
        *self.index.entry(flat.key()).or_insert_with(|| {
            self.boxes.push(flat);
            (self.boxes.len() - 1) as u32
        })
    }

    pub fn into_boxes(self) -> Vec<FlatAabb> {
        self.boxes
    }
}

pub(crate) fn word(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| CompileError::BvhOverflow(value))
}

/// Writes one mesh BVH into the shared word buffer.
pub(crate) struct BvhFlattener<'a> {
    bvh: &'a Bvh,
    /// Words taken by the subtree rooted at each arena node.
    subtree_words: Vec<usize>,
    first_triangle: usize,
    base: usize,
    bounds: &'a mut BoundsTable,
    out: &'a mut Vec<i32>,
}

impl<'a> BvhFlattener<'a> {
    /// Prepare to append `bvh` to `out`. Leaf triangle words are offset by
    /// `first_triangle`, the mesh's position in the shared triangle table.
    pub fn new(
        bvh: &'a Bvh,
        first_triangle: usize,
        bounds: &'a mut BoundsTable,
        out: &'a mut Vec<i32>,
    ) -> Self {
        let nodes = bvh.nodes();
        let mut subtree_words = vec![0; nodes.len()];
        // Children always follow their parent in the arena.
        for (i, node) in nodes.iter().enumerate().rev() {
            subtree_words[i] = match node.kind {
                BvhNodeKind::Leaf { count, .. } => leaf_words(count as usize),
                BvhNodeKind::Internal { right } => {
                    INTERNAL_WORDS + subtree_words[i + 1] + subtree_words[right as usize]
                }
            };
        }
        let base = out.len();
        Self {
            bvh,
            subtree_words,
            first_triangle,
            base,
            bounds,
            out,
        }
    }

    /// Append the records. Returns the absolute base of the run, or `None`
    /// for an empty tree.
    pub fn flatten(mut self) -> Result<Option<usize>> {
        if self.bvh.is_empty() {
            return Ok(None);
        }
        let total = self.base + self.subtree_words[0];
        word(total)?;
        self.out.reserve(self.subtree_words[0]);
        self.emit(0, END)?;
        debug_assert_eq!(self.out.len(), total);
        Ok(Some(self.base))
    }

    fn emit(&mut self, index: usize, next: i32) -> Result<()> {
        let node = self.bvh.nodes()[index];
        let bounds = word(self.bounds.insert(&node.bounds) as usize)?;
        let here = self.out.len() - self.base;

        match node.kind {
            BvhNodeKind::Leaf { count, .. } => {
                self.out
                    .extend_from_slice(&[TAG_LEAF, bounds, next, count as i32]);
                for &tri in self.bvh.leaf_triangles(&node) {
                    let tri = word(self.first_triangle + tri as usize)?;
                    self.out.push(tri);
                }
                let end = self.base + here + leaf_words(count as usize);
                self.out.resize(end, END);
            }
            BvhNodeKind::Internal { right } => {
                let left = index + 1;
                let left_offset = here + INTERNAL_WORDS;
                let right_offset = left_offset + self.subtree_words[left];
                self.out
                    .extend_from_slice(&[TAG_INTERNAL, bounds, next, word(left_offset)?]);
                self.emit(left, word(right_offset)?)?;
                self.emit(right as usize, next)?;
            }
        }
        Ok(())
    }
}
