//! Distance kernels for scoring descriptor candidates.
//!
//! Scores are exact squared Euclidean distances in `u64`. Candidate scans
//! keep the first minimum under strict `<`, so every kernel produces the
//! same winner for the same candidate order.

use crate::index::{KdTree, NodeId};
use crate::util::GckMatchResult;

/// Best candidate found so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scored {
    /// Reference point index.
    pub point: u32,
    /// Squared distance to the query.
    pub score: u64,
}

/// Tree descent for one query: the node reached and its best candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descent {
    /// Node returned by the tree query.
    pub node: NodeId,
    /// Best candidate inside that node.
    pub best: Scored,
}

/// Kernel trait for descriptor distances.
pub trait ScoreKernel {
    /// Squared Euclidean distance between equal-length descriptors.
    fn sq_dist(a: &[i32], b: &[i32]) -> u64;

    /// Returns the first candidate with the smallest distance to `query`.
    fn best_of(tree: &KdTree, candidates: &[u32], query: &[i32]) -> Option<Scored> {
        let mut best: Option<Scored> = None;
        for &point in candidates {
            let score = Self::sq_dist(query, tree.vector(point));
            if best.map_or(true, |b| score < b.score) {
                best = Some(Scored { point, score });
            }
        }
        best
    }

    /// Improves `best` with any strictly closer candidate of `node`.
    ///
    /// Returns `true` when `best` changed.
    fn rescore(tree: &KdTree, node: NodeId, query: &[i32], best: &mut Scored) -> bool {
        let mut improved = false;
        for &point in tree.candidates(node) {
            let score = Self::sq_dist(query, tree.vector(point));
            if score < best.score {
                *best = Scored { point, score };
                improved = true;
            }
        }
        improved
    }
}

/// Queries the tree and scores the reached node.
pub(crate) fn descend<K: ScoreKernel>(tree: &KdTree, query: &[i32]) -> GckMatchResult<Descent> {
    let node = tree.query(query)?;
    let best = K::best_of(tree, tree.candidates(node), query).ok_or(
        crate::util::GckMatchError::InvalidInput("tree node without candidates"),
    )?;
    Ok(Descent { node, best })
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

#[cfg(not(feature = "simd"))]
pub(crate) type ActiveKernel = scalar::SquaredL2Scalar;

#[cfg(feature = "simd")]
pub(crate) type ActiveKernel = simd::SquaredL2Simd;
