//! Adaptive k-d tree over integer descriptors.
//!
//! Nodes live in an arena and address points through a permuted slot array,
//! so a leaf is just a range of slots. Every internal node keeps its median
//! point as a representative that belongs to neither child; a query whose
//! vector equals the representative stops there. Splitting axes cycle
//! through the dimension order produced by [`rank_dimensions`].
//!
//! Degenerate inputs are handled explicitly. If no axis yields a non-empty
//! right side, the node's points are deduplicated (duplicates are
//! unreachable anyway, but their owner stays queryable) and, if still
//! too many, split just below the maximum of the first non-constant axis.
//! A depth budget bounds recursion for adversarial data.

mod rank;
mod split;

pub use rank::rank_dimensions;

use crate::descriptor::DescriptorSet;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{GckMatchError, GckMatchResult};
use split::{below_max_split, dedup, median_split, Split};

/// Tree construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Largest distinct point count stored in a single leaf.
    pub leaf_cap: usize,
    /// Recursion budget; nodes at this depth become leaves regardless of size.
    pub max_depth: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            leaf_cap: 8,
            max_depth: 64,
        }
    }
}

/// Handle to a node in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Split node holding one representative point.
    Internal {
        /// Splitting dimension.
        axis: usize,
        /// Points with `v[axis] <= split` descend left.
        split: i32,
        /// Slot position of the representative.
        rep: u32,
        /// Left subtree, absent when it would be empty.
        left: Option<NodeId>,
        /// Right subtree, absent when it would be empty.
        right: Option<NodeId>,
    },
    /// Bucket of slot positions `start..start + len`.
    Leaf { start: u32, len: u32 },
}

/// Shape counters collected during construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Total node count.
    pub nodes: usize,
    /// Leaf count.
    pub leaves: usize,
    /// Deepest node depth (root is 0).
    pub depth: usize,
    /// Points dropped as exact duplicates.
    pub duplicates: usize,
    /// Splits taken below the maximum after the median failed on every axis.
    pub fallback_splits: usize,
    /// Leaves forced by the depth budget.
    pub depth_limited: usize,
}

/// Static k-d tree owning its descriptor set.
#[derive(Clone, Debug)]
pub struct KdTree {
    points: DescriptorSet,
    order: Vec<usize>,
    nodes: Vec<Node>,
    slots: Vec<u32>,
    owner: Vec<u32>,
    root: Option<NodeId>,
    stats: TreeStats,
}

impl KdTree {
    /// Builds a tree over every descriptor of `points`.
    ///
    /// An empty set yields an empty tree whose queries fail with
    /// [`GckMatchError::EmptyIndex`].
    pub fn build(points: DescriptorSet, config: BuildConfig) -> GckMatchResult<Self> {
        if config.leaf_cap == 0 {
            return Err(GckMatchError::InvalidInput("leaf_cap must be at least 1"));
        }
        let count = points.len();
        if count > u32::MAX as usize {
            return Err(GckMatchError::InvalidInput("too many points for a single tree"));
        }
        let dims = points.dims();
        let _span = trace_span!("kdtree_build", points = count, dims).entered();

        let order = rank_dimensions(points.as_slice(), dims);
        let mut slots = try_alloc::<u32>(count)?;
        slots.extend(0..count as u32);
        let mut owner = try_alloc::<u32>(count)?;
        owner.resize(count, u32::MAX);
        let nodes = try_alloc::<Node>(2 * count / config.leaf_cap + 1)?;

        let mut builder = Builder {
            points: points.as_slice(),
            dims,
            order: &order,
            config,
            nodes,
            owner,
            twins: Vec::new(),
            stats: TreeStats::default(),
        };
        let root = if count == 0 {
            None
        } else {
            Some(builder.node(&mut slots, 0, 0, 0))
        };

        let Builder {
            nodes,
            mut owner,
            twins,
            mut stats,
            ..
        } = builder;
        for &(dropped, kept) in &twins {
            owner[dropped as usize] = owner[kept as usize];
        }
        stats.nodes = nodes.len();
        stats.duplicates = twins.len();
        trace_event!(
            "kdtree_built",
            nodes = stats.nodes,
            leaves = stats.leaves,
            depth = stats.depth,
            duplicates = stats.duplicates
        );

        Ok(Self {
            points,
            order,
            nodes,
            slots,
            owner,
            root,
            stats,
        })
    }

    /// Builds a tree from `count` flat descriptors of length `dims`.
    pub fn from_flat(
        data: &[i32],
        dims: usize,
        count: usize,
        config: BuildConfig,
    ) -> GckMatchResult<Self> {
        let set = DescriptorSet::from_flat(data.to_vec(), dims, count, 1)?;
        Self::build(set, config)
    }

    /// Descends to the node whose candidates approximate `point`.
    ///
    /// Stops early at an internal node whose representative equals `point`,
    /// or at an internal node whose chosen child is absent.
    pub fn query(&self, point: &[i32]) -> GckMatchResult<NodeId> {
        if point.len() != self.points.dims() {
            return Err(GckMatchError::DimensionMismatch {
                expected: self.points.dims(),
                got: point.len(),
            });
        }
        let mut id = self.root.ok_or(GckMatchError::EmptyIndex)?;
        loop {
            match &self.nodes[id.index()] {
                Node::Leaf { .. } => return Ok(id),
                Node::Internal {
                    axis,
                    split,
                    rep,
                    left,
                    right,
                } => {
                    if self.vector(self.slots[*rep as usize]) == point {
                        return Ok(id);
                    }
                    let next = if point[*axis] <= *split { *left } else { *right };
                    match next {
                        Some(child) => id = child,
                        None => return Ok(id),
                    }
                }
            }
        }
    }

    /// Returns the point indices held by `id`: the bucket of a leaf or the
    /// representative of an internal node.
    pub fn candidates(&self, id: NodeId) -> &[u32] {
        match &self.nodes[id.index()] {
            Node::Leaf { start, len } => {
                &self.slots[*start as usize..(*start + *len) as usize]
            }
            Node::Internal { rep, .. } => &self.slots[*rep as usize..*rep as usize + 1],
        }
    }

    /// Returns the node owning point `index`.
    ///
    /// A dropped duplicate maps to the node holding its kept twin.
    pub fn leaf_of(&self, index: usize) -> Option<NodeId> {
        self.owner
            .get(index)
            .filter(|&&n| n != u32::MAX)
            .map(|&n| NodeId(n))
    }

    /// Returns descriptor `index`.
    pub fn point(&self, index: usize) -> Option<&[i32]> {
        self.points.get(index)
    }

    #[inline]
    pub(crate) fn vector(&self, index: u32) -> &[i32] {
        let dims = self.points.dims();
        let start = index as usize * dims;
        &self.points.as_slice()[start..start + dims]
    }

    /// Maps point `index` to the top-left pixel of its window.
    pub fn location(&self, index: usize) -> (usize, usize) {
        self.points.location(index)
    }

    /// Returns node `id`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the root, absent for an empty tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the indexed descriptor set.
    pub fn points(&self) -> &DescriptorSet {
        &self.points
    }

    /// Returns the dimension order used for splitting.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Returns the descriptor length.
    pub fn dims(&self) -> usize {
        self.points.dims()
    }

    /// Returns the number of indexed points, duplicates included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` when the tree indexes no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns construction counters.
    pub fn stats(&self) -> TreeStats {
        self.stats
    }
}

fn try_alloc<T>(len: usize) -> GckMatchResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| GckMatchError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    Ok(v)
}

struct Builder<'a> {
    points: &'a [i32],
    dims: usize,
    order: &'a [usize],
    config: BuildConfig,
    nodes: Vec<Node>,
    owner: Vec<u32>,
    twins: Vec<(u32, u32)>,
    stats: TreeStats,
}

impl Builder<'_> {
    // `base` is the absolute slot position of `slots[0]`; `cursor` advances
    // through the dimension order, including skipped axes.
    fn node(&mut self, slots: &mut [u32], base: usize, depth: usize, cursor: usize) -> NodeId {
        self.stats.depth = self.stats.depth.max(depth);
        if slots.len() <= self.config.leaf_cap {
            return self.leaf(slots, base);
        }
        if depth >= self.config.max_depth {
            let unique = dedup(self.points, self.dims, slots, &mut self.twins);
            trace_warn!("kdtree_depth_limit", depth = depth, points = unique);
            self.stats.depth_limited += 1;
            return self.leaf(&slots[..unique], base);
        }
        if let Some((split, next)) = self.try_axes(slots, cursor, median_split) {
            return self.internal(slots, base, depth, next, split);
        }

        let unique = dedup(self.points, self.dims, slots, &mut self.twins);
        let slots = &mut slots[..unique];
        if unique <= self.config.leaf_cap {
            return self.leaf(slots, base);
        }
        if let Some((split, next)) = self.try_axes(slots, cursor, median_split) {
            return self.internal(slots, base, depth, next, split);
        }
        if let Some((split, next)) = self.try_axes(slots, cursor, below_max_split) {
            self.stats.fallback_splits += 1;
            return self.internal(slots, base, depth, next, split);
        }
        // Distinct points always differ on some axis; kept for totality.
        self.leaf(slots, base)
    }

    fn try_axes(
        &self,
        slots: &mut [u32],
        cursor: usize,
        strategy: fn(&[i32], usize, &mut [u32], usize) -> Option<Split>,
    ) -> Option<(Split, usize)> {
        let k = self.order.len();
        (0..k).find_map(|attempt| {
            let axis = self.order[(cursor + attempt) % k];
            strategy(self.points, self.dims, slots, axis).map(|s| (s, cursor + attempt + 1))
        })
    }

    fn leaf(&mut self, slots: &[u32], base: usize) -> NodeId {
        let id = self.push(Node::Leaf {
            start: base as u32,
            len: slots.len() as u32,
        });
        for &s in slots {
            self.owner[s as usize] = id.0;
        }
        self.stats.leaves += 1;
        id
    }

    fn internal(
        &mut self,
        slots: &mut [u32],
        base: usize,
        depth: usize,
        cursor: usize,
        split: Split,
    ) -> NodeId {
        let id = self.push(Node::Leaf { start: 0, len: 0 });
        let pivot = split.pivot;
        self.owner[slots[pivot] as usize] = id.0;

        let (left_slots, rest) = slots.split_at_mut(pivot);
        let right_slots = &mut rest[1..];
        let left = if left_slots.is_empty() {
            None
        } else {
            Some(self.node(left_slots, base, depth + 1, cursor))
        };
        let right = if right_slots.is_empty() {
            None
        } else {
            Some(self.node(right_slots, base + pivot + 1, depth + 1, cursor))
        };

        self.nodes[id.index()] = Node::Internal {
            axis: split.axis,
            split: split.value,
            rep: (base + pivot) as u32,
            left,
            right,
        };
        id
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}
