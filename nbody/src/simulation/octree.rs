//! # Barnes–Hut Octree (3D)
//!
//! Recursive cubic partition of space used by the Barnes–Hut solver.
//!
//! - The root cube encloses every body (see [`Bounds::enclosing`]).
//! - A cube holding two bodies is split into octants; children are only
//!   allocated for octants that actually receive a body.
//! - Every node carries the total mass and center of mass of its subtree.
//!
//! Nodes live in a flat arena (`Vec<OctreeNode>`) and refer to their
//! children by index, so a rebuild every step costs one growing vector
//! instead of one allocation per node. A child is always pushed after its
//! parent, which lets the aggregate pass run as a single reverse sweep.
//!
//! Two bodies at (numerically) the same position would split forever. The
//! builder stops at `max_depth` and keeps the remaining bodies together in a
//! [`NodeKind::Bucket`], whose aggregate stands in for all of them.
//!
//! The tree is read-only once [`Octree::build`] returns and is meant to be
//! thrown away after one force evaluation.

use log::debug;

use crate::simulation::forces::pair_acceleration;
use crate::simulation::params::Gravity;
use crate::simulation::states::{NVec3, SystemState};

/// Depth at which subdivision stops. Below ~50 halvings a cell is narrower
/// than the spacing of representable f64 values around typical coordinates.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Relative padding applied to the tightest enclosing half-width.
pub const BOUNDS_MARGIN_REL: f64 = 1e-6;
/// Absolute padding, keeps a single body (zero extent) in a non-degenerate cube.
pub const BOUNDS_MARGIN_ABS: f64 = 1e-10;

/// Axis-aligned cube given by its center and half-width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: NVec3,
    pub half_width: f64,
}

impl Bounds {
    pub fn new(center: NVec3, half_width: f64) -> Self {
        Self { center, half_width }
    }

    /// Smallest cube around `positions`, padded by
    /// `half * BOUNDS_MARGIN_REL + BOUNDS_MARGIN_ABS`.
    ///
    /// The padding keeps bodies that sit exactly on the extreme coordinates
    /// strictly inside the root cube.
    pub fn enclosing(positions: &[NVec3]) -> Self {
        if positions.is_empty() {
            return Self::new(NVec3::zeros(), BOUNDS_MARGIN_ABS);
        }

        let mut min = NVec3::repeat(f64::INFINITY);
        let mut max = NVec3::repeat(f64::NEG_INFINITY);
        for p in positions {
            min = min.inf(p);
            max = max.sup(p);
        }

        // Expand to a cube so node width is well-defined
        let center = (min + max) * 0.5;
        let half = (max - min).max() * 0.5;

        Self::new(center, half * (1.0 + BOUNDS_MARGIN_REL) + BOUNDS_MARGIN_ABS)
    }

    /// Full edge length `s` used by the opening criterion.
    pub fn width(&self) -> f64 {
        2.0 * self.half_width
    }

    /// Closed containment test.
    pub fn contains(&self, p: &NVec3) -> bool {
        let d = p - self.center;
        d.x.abs() <= self.half_width && d.y.abs() <= self.half_width && d.z.abs() <= self.half_width
    }

    /// Octant index of `p` relative to the cube center.
    ///
    /// - Bit 0 (value 1): x >= center.x
    /// - Bit 1 (value 2): y >= center.y
    /// - Bit 2 (value 4): z >= center.z
    pub fn octant(&self, p: &NVec3) -> usize {
        let mut idx = 0;
        if p.x >= self.center.x { idx |= 1; }
        if p.y >= self.center.y { idx |= 2; }
        if p.z >= self.center.z { idx |= 4; }
        idx
    }

    /// Cube of child octant `octant` (same bit encoding as [`Bounds::octant`]).
    pub fn child(&self, octant: usize) -> Self {
        let quarter = 0.5 * self.half_width;
        let sign = |bit: usize| if octant & bit == 0 { -quarter } else { quarter };
        let offset = NVec3::new(sign(1), sign(2), sign(4));
        Self::new(self.center + offset, quarter)
    }
}

/// What a node holds directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// No bodies (only possible for the root of an empty system).
    Empty,
    /// Exactly one body.
    Leaf(usize),
    /// Several bodies merged at the depth limit; index into the bucket table.
    Bucket(usize),
    /// Up to 8 children, aggregates over all descendants.
    Internal,
}

#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub bounds: Bounds,
    pub mass: f64,
    pub com: NVec3,
    pub children: [Option<usize>; 8], // indices into Octree::nodes
    pub kind: NodeKind,
    pub depth: usize,
}

impl OctreeNode {
    fn empty(bounds: Bounds, depth: usize) -> Self {
        Self {
            bounds,
            mass: 0.0,
            com: NVec3::zeros(),
            children: [None; 8],
            kind: NodeKind::Empty,
            depth,
        }
    }

    pub fn child_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().flatten().copied()
    }
}

pub struct Octree {
    nodes: Vec<OctreeNode>,
    buckets: Vec<Vec<usize>>,
    max_depth: usize,
}

impl Octree {
    pub const ROOT: usize = 0;

    /// Build an octree over `state` with [`DEFAULT_MAX_DEPTH`].
    ///
    /// `bounds` must enclose every position; use [`Bounds::enclosing`] when
    /// in doubt.
    pub fn build(state: &SystemState, bounds: Bounds) -> Self {
        Self::build_with_depth(state, bounds, DEFAULT_MAX_DEPTH)
    }

    pub fn build_with_depth(state: &SystemState, bounds: Bounds, max_depth: usize) -> Self {
        let positions = state.positions();
        let masses = state.masses();

        let mut nodes = Vec::with_capacity(2 * positions.len() + 1);
        nodes.push(OctreeNode::empty(bounds, 0));

        let mut tree = Self {
            nodes,
            buckets: Vec::new(),
            max_depth,
        };

        for i in 0..positions.len() {
            tree.insert(i, positions);
        }
        tree.aggregate(positions, masses);

        if !tree.buckets.is_empty() {
            let merged: usize = tree.buckets.iter().map(Vec::len).sum();
            debug!(
                "octree depth limit {} reached: {} bodies merged into {} buckets",
                max_depth,
                merged,
                tree.buckets.len()
            );
        }

        tree
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, idx: usize) -> &OctreeNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes holding exactly one body.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n.kind, NodeKind::Leaf(_))).count()
    }

    /// Bodies merged into bucket `id` (see [`NodeKind::Bucket`]).
    pub fn bucket(&self, id: usize) -> &[usize] {
        &self.buckets[id]
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Deepest level that holds a node.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    // Insertion ============================================================================

    /// Walk down from the root until body `body` finds an empty slot.
    ///
    /// - empty node: the body becomes its leaf
    /// - leaf: the resident body is pushed one level down and the walk
    ///   continues, unless the depth limit is reached, in which case both
    ///   go into a bucket
    /// - bucket: the body joins it
    /// - internal: descend into the octant containing the body
    fn insert(&mut self, body: usize, positions: &[NVec3]) {
        let pos = positions[body];
        let mut node_idx = Self::ROOT;

        loop {
            let depth = self.nodes[node_idx].depth;
            match self.nodes[node_idx].kind {
                NodeKind::Empty => {
                    self.nodes[node_idx].kind = NodeKind::Leaf(body);
                    return;
                }
                NodeKind::Bucket(id) => {
                    self.buckets[id].push(body);
                    return;
                }
                NodeKind::Leaf(resident) => {
                    if depth >= self.max_depth {
                        self.nodes[node_idx].kind = NodeKind::Bucket(self.buckets.len());
                        self.buckets.push(vec![resident, body]);
                        return;
                    }
                    self.nodes[node_idx].kind = NodeKind::Internal;
                    let child = self.child_for(node_idx, &positions[resident]);
                    self.nodes[child].kind = NodeKind::Leaf(resident);
                }
                NodeKind::Internal => {}
            }
            node_idx = self.child_for(node_idx, &pos);
        }
    }

    /// Index of the child of `node_idx` whose octant contains `p`,
    /// allocating it if needed.
    fn child_for(&mut self, node_idx: usize, p: &NVec3) -> usize {
        let parent = &self.nodes[node_idx];
        let octant = parent.bounds.octant(p);
        if let Some(idx) = parent.children[octant] {
            return idx;
        }

        let child = OctreeNode::empty(parent.bounds.child(octant), parent.depth + 1);
        let idx = self.nodes.len();
        self.nodes.push(child);
        self.nodes[node_idx].children[octant] = Some(idx);
        idx
    }

    /// Bottom-up mass / center-of-mass pass.
    ///
    /// Children always have larger indices than their parent, so visiting
    /// the arena back to front sees every child before its parent.
    fn aggregate(&mut self, positions: &[NVec3], masses: &[f64]) {
        for idx in (0..self.nodes.len()).rev() {
            let (mass, weighted) = match self.nodes[idx].kind {
                NodeKind::Empty => (0.0, NVec3::zeros()),
                NodeKind::Leaf(b) => (masses[b], positions[b] * masses[b]),
                NodeKind::Bucket(id) => self.buckets[id]
                    .iter()
                    .fold((0.0, NVec3::zeros()), |(m, w), &b| (m + masses[b], w + positions[b] * masses[b])),
                NodeKind::Internal => self.nodes[idx]
                    .child_indices()
                    .map(|c| &self.nodes[c])
                    .fold((0.0, NVec3::zeros()), |(m, w), child| (m + child.mass, w + child.com * child.mass)),
            };

            let node = &mut self.nodes[idx];
            node.mass = mass;
            node.com = match node.kind {
                // a single body's COM is its position, exactly
                NodeKind::Leaf(b) => positions[b],
                _ if mass > 0.0 => weighted / mass,
                _ => node.bounds.center,
            };
        }
    }

    // Walk =================================================================================

    /// Acceleration on body `body` from every other body in the tree.
    ///
    /// At each node:
    /// - empty: skipped
    /// - leaf: exact pairwise term, unless it holds `body` itself
    /// - bucket: aggregate term, or pairwise terms from the other members
    ///   if `body` is one of them
    /// - internal: with `s` the node width and `d` the distance to its
    ///   center of mass, the aggregate is used when `s / d < theta` and the
    ///   node's cube does not contain `body`; otherwise the children are
    ///   visited
    pub fn acceleration_on(
        &self,
        body: usize,
        positions: &[NVec3],
        masses: &[f64],
        gravity: &Gravity,
        theta: f64,
    ) -> NVec3 {
        let walk = Walk {
            tree: self,
            body,
            pos: positions[body],
            positions,
            masses,
            g: gravity.G,
            eps2: gravity.eps2(),
            theta,
        };
        let mut acc = NVec3::zeros();
        walk.visit(Self::ROOT, &mut acc);
        acc
    }
}

/// Per-body traversal context.
struct Walk<'a> {
    tree: &'a Octree,
    body: usize,
    pos: NVec3,
    positions: &'a [NVec3],
    masses: &'a [f64],
    g: f64,
    eps2: f64,
    theta: f64,
}

impl Walk<'_> {
    fn visit(&self, node_idx: usize, acc: &mut NVec3) {
        let node = &self.tree.nodes[node_idx];

        match node.kind {
            NodeKind::Empty => {}
            NodeKind::Leaf(b) => {
                if b != self.body {
                    *acc += pair_acceleration(node.com - self.pos, node.mass, self.g, self.eps2);
                }
            }
            NodeKind::Bucket(id) => {
                let members = &self.tree.buckets[id];
                if members.contains(&self.body) {
                    for &b in members.iter().filter(|&&b| b != self.body) {
                        *acc += pair_acceleration(self.positions[b] - self.pos, self.masses[b], self.g, self.eps2);
                    }
                } else {
                    *acc += pair_acceleration(node.com - self.pos, node.mass, self.g, self.eps2);
                }
            }
            NodeKind::Internal => {
                let r = node.com - self.pos;
                let s_over_d = node.bounds.width() / r.norm();

                if s_over_d < self.theta && !node.bounds.contains(&self.pos) {
                    // far enough: the whole subtree acts as one mass at its COM
                    *acc += pair_acceleration(r, node.mass, self.g, self.eps2);
                } else {
                    for child in node.child_indices() {
                        self.visit(child, acc);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octant_bits_follow_axes() {
        let b = Bounds::new(NVec3::zeros(), 1.0);
        assert_eq!(b.octant(&NVec3::new(-0.5, -0.5, -0.5)), 0);
        assert_eq!(b.octant(&NVec3::new(0.5, -0.5, -0.5)), 1);
        assert_eq!(b.octant(&NVec3::new(-0.5, 0.5, -0.5)), 2);
        assert_eq!(b.octant(&NVec3::new(0.5, 0.5, 0.5)), 7);
        // on the split plane goes to the upper half
        assert_eq!(b.octant(&NVec3::zeros()), 7);
    }

    #[test]
    fn child_cube_contains_points_of_its_octant() {
        let b = Bounds::new(NVec3::new(1.0, 2.0, 3.0), 4.0);
        let p = NVec3::new(2.5, 0.5, 6.0);
        let child = b.child(b.octant(&p));
        assert!(child.contains(&p));
        assert_eq!(child.half_width, 2.0);
    }

    #[test]
    fn enclosing_bounds_are_a_padded_cube() {
        let pts = [NVec3::new(-1.0, 0.0, 0.0), NVec3::new(3.0, 1.0, 0.5)];
        let b = Bounds::enclosing(&pts);
        assert_eq!(b.center, NVec3::new(1.0, 0.5, 0.25));
        assert!(b.half_width > 2.0);
        assert!(pts.iter().all(|p| b.contains(p)));
    }

    #[test]
    fn single_body_bounds_are_not_degenerate() {
        let b = Bounds::enclosing(&[NVec3::new(5.0, 5.0, 5.0)]);
        assert!(b.half_width > 0.0);
    }
}
