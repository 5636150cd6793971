//! Leaf-contrast saliency.
//!
//! A window is salient when the other descriptors sharing its tree leaf are
//! dissimilar in appearance yet close in position. Repetitive texture
//! yields near-zero scores; isolated structures approach one.

use crate::descriptor::DescriptorSet;
use crate::index::KdTree;
use crate::kernel::{descend, ActiveKernel, ScoreKernel};
use crate::trace::trace_span;
use crate::util::{GckMatchError, GckMatchResult};

/// Per-position saliency in `[0, 1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SaliencyMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl SaliencyMap {
    /// Returns the grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the scores in raster order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the score at grid position `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }
}

/// Scores every query descriptor by contrast with its leaf companions.
///
/// For the best candidate `b` of the reached node and every other candidate
/// `c`, accumulates `|c - b| / (1 + 3 * dist(loc(c), loc(b)))` and maps the
/// mean over all candidates through `1 - exp(-x)`.
pub fn saliency(tree: &KdTree, queries: &DescriptorSet) -> GckMatchResult<SaliencyMap> {
    if queries.dims() != tree.dims() {
        return Err(GckMatchError::DimensionMismatch {
            expected: tree.dims(),
            got: queries.dims(),
        });
    }
    let _span = trace_span!("saliency", width = queries.width(), height = queries.height()).entered();

    let mut values = Vec::with_capacity(queries.len());
    for query in queries.as_slice().chunks_exact(queries.dims()) {
        let descent = descend::<ActiveKernel>(tree, query)?;
        let candidates = tree.candidates(descent.node);
        let best = descent.best.point;
        let (bx, by) = tree.location(best as usize);
        let mut total = 0.0f64;
        for &c in candidates.iter().filter(|&&c| c != best) {
            let color = (ActiveKernel::sq_dist(tree.vector(c), tree.vector(best)) as f64).sqrt();
            let (cx, cy) = tree.location(c as usize);
            let pos = (cx as f64 - bx as f64).hypot(cy as f64 - by as f64);
            total += color / (1.0 + 3.0 * pos);
        }
        let value = 1.0 - (-total / candidates.len() as f64).exp();
        values.push(value as f32);
    }

    Ok(SaliencyMap {
        width: queries.width(),
        height: queries.height(),
        values,
    })
}
