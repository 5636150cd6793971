//! Raster-order coherence sweep.

use crate::descriptor::DescriptorSet;
use crate::index::{KdTree, NodeId};
use crate::kernel::{Descent, ScoreKernel, Scored};
use crate::search::{Correspondence, MatchConfig};

// Left, top, and two hop targets; the tree's own node is always first.
const MAX_VISITS: usize = 5;

struct Walk<'a> {
    tree: &'a KdTree,
    query: &'a [i32],
    best: Scored,
    node: NodeId,
    seen: [NodeId; MAX_VISITS],
    seen_len: usize,
}

impl<'a> Walk<'a> {
    fn new(tree: &'a KdTree, query: &'a [i32], start: Descent) -> Self {
        Self {
            tree,
            query,
            best: start.best,
            node: start.node,
            seen: [start.node; MAX_VISITS],
            seen_len: 1,
        }
    }

    fn visit<K: ScoreKernel>(&mut self, node: NodeId) {
        if self.seen[..self.seen_len].contains(&node) {
            return;
        }
        if self.seen_len < MAX_VISITS {
            self.seen[self.seen_len] = node;
            self.seen_len += 1;
        }
        if K::rescore(self.tree, node, self.query, &mut self.best) {
            self.node = node;
        }
    }
}

// Reference point one grid step right (dx) or down (dy) of `point`.
fn shifted(tree: &KdTree, point: u32, dx: usize, dy: usize) -> Option<usize> {
    let (rw, rh) = (tree.points().width(), tree.points().height());
    let p = point as usize;
    let (gx, gy) = (p % rw + dx, p / rw + dy);
    (gx < rw && gy < rh).then_some(gy * rw + gx)
}

/// Refines per-position descents with neighbour information.
///
/// Positions are visited in raster order; each one reads only already
/// finalised left and top results, so the output is deterministic.
pub(crate) fn sweep<K: ScoreKernel>(
    tree: &KdTree,
    queries: &DescriptorSet,
    descents: &[Descent],
    cfg: MatchConfig,
) -> Vec<Correspondence> {
    let width = queries.width();
    let dims = queries.dims();
    let mut winners: Vec<NodeId> = Vec::with_capacity(descents.len());
    let mut out: Vec<Correspondence> = Vec::with_capacity(descents.len());

    for (pos, (&start, query)) in descents
        .iter()
        .zip(queries.as_slice().chunks_exact(dims))
        .enumerate()
    {
        let mut walk = Walk::new(tree, query, start);
        if cfg.coherence {
            let left = (pos % width > 0).then(|| pos - 1);
            let top = (pos >= width).then(|| pos - width);
            for &n in [left, top].iter().flatten() {
                walk.visit::<K>(winners[n]);
            }
            if cfg.hops {
                let hops = [
                    left.and_then(|n| shifted(tree, out[n].point, 1, 0)),
                    top.and_then(|n| shifted(tree, out[n].point, 0, 1)),
                ];
                for p in hops.into_iter().flatten() {
                    if let Some(node) = tree.leaf_of(p) {
                        walk.visit::<K>(node);
                    }
                }
            }
        }

        let (x, y) = tree.location(walk.best.point as usize);
        out.push(Correspondence {
            x,
            y,
            point: walk.best.point,
            score: walk.best.score,
            improved: walk.best.point != start.best.point,
        });
        winners.push(walk.node);
    }
    out
}
