//! Bounding Volume Hierarchy over a triangle list.
//!
//! Uses Surface Area Heuristic (SAH) for construction. The tree is stored as
//! an arena: nodes in pre-order in one `Vec`, the left child of an internal
//! node immediately after it, and leaf triangles as ranges into one shared
//! index list. The compiler flattens this arena into the threaded word
//! layout the kernel walks; [`Bvh::nearest_hit`] is a plain explicit-stack
//! traversal of the same tree, kept as the reference the flat walk is
//! tested against.

use flatray_geom::Triangle;
use flatray_math::{Aabb, Point3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::intersect::triangle::{self, TriangleHit};
use crate::Ray;

/// SAH construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhOptions {
    /// Working sets smaller than this become leaves without trying a split.
    pub leaf_threshold: usize,
    /// Candidate planes per axis at the root.
    pub max_split_candidates: usize,
    /// Floor on candidate planes per axis at any depth.
    pub min_split_candidates: usize,
}

impl Default for BvhOptions {
    fn default() -> Self {
        Self {
            leaf_threshold: 4,
            max_split_candidates: 32,
            min_split_candidates: 4,
        }
    }
}

impl BvhOptions {
    /// Candidate planes per axis for a node at `depth`: the root count halves
    /// with every level, but never drops below the floor.
    pub fn split_candidates(&self, depth: u32) -> usize {
        let shrunk = self.max_split_candidates.checked_shr(depth).unwrap_or(0);
        shrunk.max(self.min_split_candidates)
    }
}

/// Leaf or internal payload of a [`BvhNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhNodeKind {
    /// Leaf holding `count` entries of the index list starting at `first`.
    Leaf {
        /// First entry in [`Bvh::indices`].
        first: u32,
        /// Number of triangles.
        count: u32,
    },
    /// Internal node. The left child is always the next node in the arena.
    Internal {
        /// Arena index of the right child.
        right: u32,
    },
}

/// A BVH node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    /// Union of the boxes of every triangle below this node.
    pub bounds: Aabb,
    /// Summed area of every triangle below this node.
    pub area: f32,
    /// Depth from the root (root = 0).
    pub depth: u32,
    /// Payload.
    pub kind: BvhNodeKind,
}

impl BvhNode {
    /// True for leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, BvhNodeKind::Leaf { .. })
    }
}

/// Shape statistics of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    /// Total nodes.
    pub nodes: usize,
    /// Leaf nodes.
    pub leaves: usize,
    /// Deepest leaf depth.
    pub max_depth: u32,
    /// Most triangles in a single leaf.
    pub max_leaf_size: usize,
}

/// Bounding Volume Hierarchy over the triangles of one mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
}

/// Per-triangle leaf proxy: the triangle's index, its box and the box midpoint.
#[derive(Debug, Clone, Copy)]
struct Proxy {
    index: u32,
    bounds: Aabb,
    center: Point3,
    area: f32,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    axis: usize,
    position: f32,
    cost: f32,
}

impl Bvh {
    /// Build a BVH over `triangles` using SAH construction.
    ///
    /// An empty slice gives an empty tree with no root.
    pub fn build(triangles: &[Triangle], options: &BvhOptions) -> Self {
        let mut proxies: Vec<Proxy> = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| {
                let bounds = tri.bounds();
                Proxy {
                    index: i as u32,
                    bounds,
                    center: bounds.center(),
                    area: tri.area(),
                }
            })
            .collect();

        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * triangles.len() / options.leaf_threshold.max(1) + 1),
            indices: Vec::with_capacity(triangles.len()),
        };
        if !proxies.is_empty() {
            bvh.build_node(&mut proxies, 0, options);
        }

        let stats = bvh.stats();
        debug!(
            "built BVH over {} triangles: {} nodes, {} leaves, max depth {}, largest leaf {}",
            triangles.len(),
            stats.nodes,
            stats.leaves,
            stats.max_depth,
            stats.max_leaf_size
        );
        bvh
    }

    /// Recursively build the subtree over `proxies`, appending in pre-order.
    /// Returns the arena index of the subtree root.
    fn build_node(&mut self, proxies: &mut [Proxy], depth: u32, options: &BvhOptions) -> u32 {
        let mut bounds = Aabb::empty();
        for p in proxies.iter() {
            bounds.include_aabb(&p.bounds);
        }

        let index = self.nodes.len() as u32;
        let split = if proxies.len() < options.leaf_threshold {
            None
        } else {
            find_best_split(proxies, &bounds, options.split_candidates(depth))
        };

        let Some(split) = split else {
            let first = self.indices.len() as u32;
            self.indices.extend(proxies.iter().map(|p| p.index));
            self.nodes.push(BvhNode {
                bounds,
                area: proxies.iter().map(|p| p.area).sum(),
                depth,
                kind: BvhNodeKind::Leaf {
                    first,
                    count: proxies.len() as u32,
                },
            });
            return index;
        };

        // Reserve this node; the right child index is patched once known.
        self.nodes.push(BvhNode {
            bounds,
            area: 0.0,
            depth,
            kind: BvhNodeKind::Internal { right: 0 },
        });

        let mid = partition_proxies(proxies, split.axis, split.position);
        let (left_set, right_set) = proxies.split_at_mut(mid);
        let left = self.build_node(left_set, depth + 1, options);
        let right = self.build_node(right_set, depth + 1, options);

        let area = self.nodes[left as usize].area + self.nodes[right as usize].area;
        let node = &mut self.nodes[index as usize];
        node.area = area;
        node.kind = BvhNodeKind::Internal { right };
        index
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node, if any.
    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.first()
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// The triangle index list leaves point into.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Arena index of the left child of internal node `index`.
    pub fn left_child(index: u32) -> u32 {
        index + 1
    }

    /// Triangle indices held by `node`; empty for internal nodes.
    pub fn leaf_triangles(&self, node: &BvhNode) -> &[u32] {
        match node.kind {
            BvhNodeKind::Leaf { first, count } => {
                &self.indices[first as usize..(first + count) as usize]
            }
            BvhNodeKind::Internal { .. } => &[],
        }
    }

    /// Bounds of the whole tree (empty box for an empty tree).
    pub fn bounds(&self) -> Aabb {
        self.root().map_or_else(Aabb::empty, |n| n.bounds)
    }

    /// Summed triangle area of the whole tree.
    pub fn area(&self) -> f32 {
        self.root().map_or(0.0, |n| n.area)
    }

    /// Node and leaf counts, depth and largest leaf.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            nodes: self.nodes.len(),
            ..BvhStats::default()
        };
        for node in &self.nodes {
            if let BvhNodeKind::Leaf { count, .. } = node.kind {
                stats.leaves += 1;
                stats.max_depth = stats.max_depth.max(node.depth);
                stats.max_leaf_size = stats.max_leaf_size.max(count as usize);
            }
        }
        stats
    }

    /// Nearest triangle hit in `(t_min, t_max)`, walking the tree with an
    /// explicit stack. `triangles` must be the slice the tree was built over.
    ///
    /// Returns the triangle index and its hit.
    pub fn nearest_hit(
        &self,
        triangles: &[Triangle],
        ray: &Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<(u32, TriangleHit)> {
        let mut best: Option<(u32, TriangleHit)> = None;
        let mut closest = t_max;
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        if !self.nodes.is_empty() {
            stack.push(0);
        }

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if ray.intersect_aabb(&node.bounds, t_min, closest).is_none() {
                continue;
            }
            match node.kind {
                BvhNodeKind::Leaf { .. } => {
                    for &tri in self.leaf_triangles(node) {
                        let face = &triangles[tri as usize];
                        if let Some(hit) = triangle::intersection_t(ray, face, t_min, closest) {
                            closest = hit.t;
                            best = Some((tri, hit));
                        }
                    }
                }
                BvhNodeKind::Internal { right } => {
                    stack.push(right);
                    stack.push(Self::left_child(index));
                }
            }
        }

        best
    }
}

/// Find the cheapest split plane over all three axes, or `None` if no
/// candidate beats keeping the proxies in one leaf.
fn find_best_split(proxies: &[Proxy], bounds: &Aabb, candidates: usize) -> Option<Split> {
    let extent = bounds.extent();
    let no_split = bounds.surface_area() * proxies.len() as f32;
    let mut best: Option<Split> = None;

    for axis in 0..3 {
        if !(extent[axis] > 0.0) {
            continue;
        }
        for i in 0..candidates {
            // Evenly spaced strictly inside the box.
            let fraction = (i + 1) as f32 / (candidates + 1) as f32;
            let position = bounds.min[axis] + extent[axis] * fraction;

            let mut left_bounds = Aabb::empty();
            let mut right_bounds = Aabb::empty();
            let mut left_count = 0usize;
            let mut right_count = 0usize;
            for p in proxies {
                if p.center[axis] < position {
                    left_bounds.include_aabb(&p.bounds);
                    left_count += 1;
                } else {
                    right_bounds.include_aabb(&p.bounds);
                    right_count += 1;
                }
            }

            if left_count <= 1 || right_count <= 1 {
                continue;
            }

            let cost = left_bounds.surface_area() * left_count as f32
                + right_bounds.surface_area() * right_count as f32;
            if best.map_or(true, |b| cost < b.cost) {
                best = Some(Split {
                    axis,
                    position,
                    cost,
                });
            }
        }
    }

    best.filter(|s| s.cost < no_split)
}

/// Partition proxies by box midpoint along an axis. Returns the size of the
/// lower half.
fn partition_proxies(proxies: &mut [Proxy], axis: usize, position: f32) -> usize {
    let mut left = 0;
    let mut right = proxies.len();

    while left < right {
        if proxies[left].center[axis] < position {
            left += 1;
        } else {
            right -= 1;
            proxies.swap(left, right);
        }
    }

    left
}
