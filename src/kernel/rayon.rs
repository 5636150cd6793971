//! Rayon-parallel descent helpers (feature-gated).
//!
//! Tree descent and leaf scoring are independent per query, so they run
//! row-parallel. The coherence sweep that consumes these results stays
//! sequential because every position reads its left and top neighbours.

use crate::descriptor::DescriptorSet;
use crate::index::KdTree;
use crate::kernel::{descend, Descent, ScoreKernel};
use crate::util::GckMatchResult;
use rayon::prelude::*;

/// Row-parallel tree descent for every query descriptor.
///
/// Output is in raster order and identical to a sequential loop.
pub fn descend_all_par<K: ScoreKernel>(
    tree: &KdTree,
    queries: &DescriptorSet,
) -> GckMatchResult<Vec<Descent>> {
    let width = queries.width();
    let dims = queries.dims();
    if width == 0 || dims == 0 {
        return Ok(Vec::new());
    }
    let rows: Vec<Vec<Descent>> = queries
        .as_slice()
        .par_chunks(width * dims)
        .map(|row| {
            row.chunks_exact(dims)
                .map(|q| descend::<K>(tree, q))
                .collect::<GckMatchResult<Vec<_>>>()
        })
        .collect::<GckMatchResult<Vec<_>>>()?;
    Ok(rows.into_iter().flatten().collect())
}
