//! An arena backed tree over the bit planes of RGBA samples.
//!
//! Each level of the tree consumes one bit of each channel, starting at the most significant bit.
//! The four bits at a level form a 4-bit branch key: bit 0 is red, bit 1 is green, bit 2 is blue,
//! and bit 3 is alpha. A path from the root to a node at full depth therefore identifies a
//! bucket of colors that agree on their most significant bits.

use crate::{Sample, SignificantBits};
use alloc::{vec, vec::Vec};
use core::num::NonZeroUsize;

/// The number of children of each node, one per 4-bit branch key.
const BRANCHES: usize = 16;

/// A handle to a node in a [`QuantTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(NonZeroUsize);

impl NodeId {
    /// The root node, which is always the first node of the arena.
    pub const ROOT: Self = Self(NonZeroUsize::MIN);

    /// Returns the index of this node in the arena.
    #[inline]
    const fn index(self) -> usize {
        self.0.get() - 1
    }

    /// Returns the handle of the node at `index` in the arena.
    ///
    /// Arena indices are below `isize::MAX`, so the shifted index never saturates.
    #[inline]
    fn from_index(index: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(index))
    }
}

/// A node of a [`QuantTree`].
#[derive(Debug, Clone)]
struct QuantNode {
    /// The children of this node indexed by branch key.
    children: [Option<NodeId>; BRANCHES],
    /// The parent of this node, `None` only for the root.
    parent: Option<NodeId>,
    /// The number of samples whose path passes through this node.
    count: u64,
    /// Whether this node was pruned.
    ignore: bool,
    /// The branch key leading from the parent to this node, `None` only for the root.
    key: Option<u8>,
}

impl QuantNode {
    /// Create a new node with no children.
    fn new(parent: Option<NodeId>, key: Option<u8>) -> Self {
        Self {
            children: [None; BRANCHES],
            parent,
            count: 0,
            ignore: false,
            key,
        }
    }
}

/// A frequency weighted tree over the bit planes of RGBA samples.
///
/// Nodes are stored in an arena and reference each other by [`NodeId`]. Pruned nodes are only
/// flagged as ignored and stay linked to their parent, so node handles and the order of siblings
/// never change while the tree is alive.
///
/// # Examples
///
/// ```
/// # use alphaquant::{Sample, SignificantBits, quantize::QuantTree};
/// let mut tree = QuantTree::new(SignificantBits::DEFAULT);
/// tree.add(Sample::opaque(255, 0, 0));
/// tree.add(Sample::opaque(255, 0, 0));
/// tree.add(Sample::opaque(0, 0, 255));
///
/// let leaves = tree.leaves();
/// assert_eq!(leaves.len(), 2);
/// assert_eq!(tree.to_rgba(leaves[0]), Sample::opaque(248, 0, 0));
/// assert_eq!(tree.count(leaves[0]), 2);
/// ```
#[derive(Debug, Clone)]
pub struct QuantTree {
    /// The node arena, with the root at index `0`.
    nodes: Vec<QuantNode>,
    /// The number of levels below the root.
    bits: SignificantBits,
}

impl QuantTree {
    /// Create a new, empty [`QuantTree`].
    #[must_use]
    pub fn new(bits: SignificantBits) -> Self {
        Self { nodes: vec![QuantNode::new(None, None)], bits }
    }

    /// Returns the number of significant bits, which is also the depth of the tree.
    #[inline]
    pub fn significant_bits(&self) -> SignificantBits {
        self.bits
    }

    /// Returns the number of nodes in the tree, including pruned nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of samples added to the tree.
    #[inline]
    pub fn total_count(&self) -> u64 {
        self.node(NodeId::ROOT).count
    }

    /// Returns a reference to the node behind `id`.
    #[inline]
    fn node(&self, id: NodeId) -> &QuantNode {
        &self.nodes[id.index()]
    }

    /// Returns a mutable reference to the node behind `id`.
    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut QuantNode {
        &mut self.nodes[id.index()]
    }

    /// Returns the child of `parent` at `key`, creating it if it does not exist.
    fn child_or_insert(&mut self, parent: NodeId, key: u8) -> NodeId {
        if let Some(child) = self.node(parent).children[usize::from(key)] {
            child
        } else {
            let child = NodeId::from_index(self.nodes.len());
            self.nodes.push(QuantNode::new(Some(parent), Some(key)));
            self.node_mut(parent).children[usize::from(key)] = Some(child);
            child
        }
    }

    /// Returns the branch key of `sample` at `level`, where level `0` is just below the root.
    #[inline]
    fn branch_key(sample: Sample, level: u8) -> u8 {
        let shift = 7 - level;
        let bit = |channel: u8| (channel >> shift) & 1;
        bit(sample.red)
            | bit(sample.green) << 1
            | bit(sample.blue) << 2
            | bit(sample.alpha) << 3
    }

    /// Insert one sample into the tree.
    ///
    /// The sample descends one level per significant bit, creating nodes as needed, and the count
    /// of every node along its path, including the root, is incremented.
    ///
    /// Samples are inserted as is. Use [`Sample::normalized`] to collapse transparent samples.
    pub fn add(&mut self, sample: Sample) {
        let mut node = NodeId::ROOT;
        self.node_mut(node).count += 1;
        for level in 0..self.bits.get() {
            node = self.child_or_insert(node, Self::branch_key(sample, level));
            self.node_mut(node).count += 1;
        }
    }

    /// Returns the number of samples that passed through `id`, plus any merged in counts.
    #[inline]
    pub fn count(&self, id: NodeId) -> u64 {
        self.node(id).count
    }

    /// Returns whether `id` was pruned.
    #[inline]
    pub fn is_ignored(&self, id: NodeId) -> bool {
        self.node(id).ignore
    }

    /// Returns the parent of `id`, or `None` for the root.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns whether `id` has at least one child that was not pruned.
    #[inline]
    fn has_active_children(&self, id: NodeId) -> bool {
        self.node(id)
            .children
            .iter()
            .flatten()
            .any(|&child| !self.is_ignored(child))
    }

    /// Returns whether `id` is a leaf: it is not pruned and has no children that are not pruned.
    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        !self.is_ignored(id) && !self.has_active_children(id)
    }

    /// Returns all leaves at or below `id` in depth first, branch key order.
    #[must_use]
    pub fn find_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if self.is_ignored(id) {
                continue;
            }
            if self.has_active_children(id) {
                stack.extend(self.node(id).children.iter().rev().flatten());
            } else {
                leaves.push(id);
            }
        }
        leaves
    }

    /// Returns all leaves of the tree.
    #[must_use]
    #[inline]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.find_leaves(NodeId::ROOT)
    }

    /// Reconstruct the representative color of `id` from the branch keys along its path.
    ///
    /// The path bits become the most significant bits of each channel and the remaining low bits
    /// are zero.
    #[must_use]
    pub fn to_rgba(&self, id: NodeId) -> Sample {
        let mut keys = [0u8; SignificantBits::MAX.get() as usize];
        let mut depth = 0;
        let mut node = self.node(id);
        while let (Some(key), Some(parent)) = (node.key, node.parent) {
            keys[depth] = key;
            depth += 1;
            node = self.node(parent);
        }

        let mut channels = [0u32; 4];
        for &key in keys[..depth].iter().rev() {
            for (c, channel) in channels.iter_mut().enumerate() {
                *channel = (*channel << 1) | u32::from((key >> c) & 1);
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let [red, green, blue, alpha] =
            channels.map(|channel| (channel << self.bits.discarded()) as u8);

        Sample::new(red, green, blue, alpha)
    }

    /// Returns the ancestor `parentage` levels above the parent of `id`, stopping at the root.
    #[must_use]
    pub fn ancestor(&self, id: NodeId, parentage: u8) -> NodeId {
        let mut ancestor = self.parent(id).unwrap_or(NodeId::ROOT);
        for _ in 0..parentage {
            match self.parent(ancestor) {
                Some(parent) => ancestor = parent,
                None => break,
            }
        }
        ancestor
    }

    /// Merge the leaf `id` into its nearest neighbor below the ancestor `parentage` levels
    /// above its parent.
    ///
    /// The nearest neighbor is the other leaf with the smallest squared euclidean distance between
    /// reconstructed colors, where the first one found wins ties. Its count absorbs the count of
    /// `id` and `id` is pruned.
    ///
    /// Returns `false` without changing the tree if `id` is the only leaf below that ancestor.
    pub fn prune(&mut self, id: NodeId, parentage: u8) -> bool {
        debug_assert!(self.is_leaf(id));

        let candidates = self.find_leaves(self.ancestor(id, parentage));
        let color = self.to_rgba(id);
        let nearest = candidates
            .into_iter()
            .filter(|&candidate| candidate != id)
            .min_by_key(|&candidate| squared_distance(color, self.to_rgba(candidate)));

        if let Some(nearest) = nearest {
            let count = self.count(id);
            self.node_mut(nearest).count += count;
            self.remove_leaf(id);
            true
        } else {
            false
        }
    }

    /// Flag `id` as pruned.
    ///
    /// Ancestors left without any children that are not pruned are pruned as well, so an inner
    /// node never turns into a leaf. The root is never pruned.
    fn remove_leaf(&mut self, id: NodeId) {
        self.node_mut(id).ignore = true;
        let mut node = id;
        while let Some(parent) = self.parent(node) {
            if parent == NodeId::ROOT || self.has_active_children(parent) {
                break;
            }
            self.node_mut(parent).ignore = true;
            node = parent;
        }
    }

    /// Add the nodes and counts of `other` into this tree.
    ///
    /// Both trees must have been built with the same number of significant bits. Pruning state
    /// is not merged, so this should only be used on freshly built trees.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.bits, other.bits);
        let mut stack = vec![(NodeId::ROOT, NodeId::ROOT)];
        while let Some((dst, src)) = stack.pop() {
            self.node_mut(dst).count += other.count(src);
            for (key, &child) in other.node(src).children.iter().enumerate() {
                if let Some(child) = child {
                    #[allow(clippy::cast_possible_truncation)]
                    let dst_child = self.child_or_insert(dst, key as u8);
                    stack.push((dst_child, child));
                }
            }
        }
    }
}

/// The squared euclidean distance between two samples over all four channels.
#[inline]
pub(crate) fn squared_distance(a: Sample, b: Sample) -> u32 {
    a.to_array()
        .into_iter()
        .zip(b.to_array())
        .map(|(a, b)| {
            let d = i32::from(a) - i32::from(b);
            d.unsigned_abs().pow(2)
        })
        .sum()
}
