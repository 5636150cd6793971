//! Coherence-guided approximate nearest-neighbour matching.
//!
//! Every query descriptor first descends the tree and scores the reached
//! node. A raster-order sweep then lets each position borrow the winning
//! nodes of its left and top neighbours, and optionally the nodes owning
//! their sources shifted one step, keeping whichever candidate is closest.
//! Neighbouring windows overlap heavily, so their sources tend to be
//! neighbours too.

mod coherence;
pub mod saliency;

use crate::descriptor::{grid_origin, DescriptorSet, DescriptorSpec};
use crate::image::ImageView;
use crate::index::KdTree;
use crate::kernel::{descend, ActiveKernel, Descent};
use crate::trace::{trace_event, trace_span};
use crate::util::{GckMatchError, GckMatchResult};

/// Matching configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    /// Re-score the winning nodes of the left and top neighbours.
    pub coherence: bool,
    /// Also visit the nodes owning the neighbours' sources shifted by one.
    pub hops: bool,
    /// Run tree descent row-parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            coherence: true,
            hops: true,
            parallel: false,
        }
    }
}

/// Source chosen for one query position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Correspondence {
    /// Reference x of the source window's top-left pixel.
    pub x: usize,
    /// Reference y of the source window's top-left pixel.
    pub y: usize,
    /// Reference point index of the source.
    pub point: u32,
    /// Squared descriptor distance to the source.
    pub score: u64,
    /// The coherence sweep replaced the tree's own candidate.
    pub improved: bool,
}

/// Dense query-position to reference-position map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateMap {
    width: usize,
    height: usize,
    step: usize,
    span: (usize, usize),
    entries: Vec<Correspondence>,
}

impl CoordinateMap {
    /// Returns the query grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the query grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the query pixel spacing between grid positions.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Returns the query pixel of grid position `(gx, gy)`.
    ///
    /// Positions are `step` apart except for a final row or column snapped
    /// to the last valid window of the query image.
    pub fn origin(&self, gx: usize, gy: usize) -> (usize, usize) {
        grid_origin(gx, gy, self.step, self.span)
    }

    /// Returns the correspondences in raster order.
    pub fn entries(&self) -> &[Correspondence] {
        &self.entries
    }

    /// Returns the correspondence at grid position `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<&Correspondence> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.entries.get(y * self.width + x)
    }

    /// Packs each source as `(y << 16) | x`.
    pub fn packed(&self) -> GckMatchResult<Vec<u32>> {
        self.entries
            .iter()
            .map(|c| {
                if c.x > 0xFFFF || c.y > 0xFFFF {
                    return Err(GckMatchError::CoordinateOverflow { x: c.x, y: c.y });
                }
                Ok(((c.y as u32) << 16) | c.x as u32)
            })
            .collect()
    }

    /// Returns the mean squared-distance score, 0 for an empty map.
    pub fn mean_score(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: f64 = self.entries.iter().map(|c| c.score as f64).sum();
        total / self.entries.len() as f64
    }

    /// Returns how many positions the coherence sweep improved.
    pub fn improved_count(&self) -> usize {
        self.entries.iter().filter(|c| c.improved).count()
    }
}

/// Matcher over a built reference tree.
#[derive(Clone, Debug)]
pub struct Matcher {
    tree: KdTree,
    cfg: MatchConfig,
}

impl Matcher {
    /// Creates a matcher with the default configuration.
    pub fn new(tree: KdTree) -> Self {
        Self {
            tree,
            cfg: MatchConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> MatchConfig {
        self.cfg
    }

    /// Returns the reference tree.
    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Finds a source for every query descriptor.
    pub fn match_descriptors(&self, queries: &DescriptorSet) -> GckMatchResult<CoordinateMap> {
        if queries.dims() != self.tree.dims() {
            return Err(GckMatchError::DimensionMismatch {
                expected: self.tree.dims(),
                got: queries.dims(),
            });
        }
        if self.tree.is_empty() {
            return Err(GckMatchError::EmptyIndex);
        }
        let _span = trace_span!(
            "match_descriptors",
            width = queries.width(),
            height = queries.height()
        )
        .entered();

        let descents = self.descend_all(queries)?;
        let entries = coherence::sweep::<ActiveKernel>(&self.tree, queries, &descents, self.cfg);
        let map = CoordinateMap {
            width: queries.width(),
            height: queries.height(),
            step: queries.step(),
            span: queries.span(),
            entries,
        };
        trace_event!(
            "match_done",
            positions = map.entries.len(),
            improved = map.improved_count()
        );
        Ok(map)
    }

    /// Matches `width * height` flat query descriptors.
    pub fn match_flat(
        &self,
        data: &[i32],
        width: usize,
        height: usize,
    ) -> GckMatchResult<CoordinateMap> {
        let queries = DescriptorSet::from_flat(data.to_vec(), self.tree.dims(), width, height)?;
        self.match_descriptors(&queries)
    }

    /// Extracts descriptors from image channels and matches them.
    ///
    /// `stride > 1` samples the query grid, `stride == spec.kernel_size`
    /// gives one query per non-overlapping block.
    pub fn match_image(
        &self,
        channels: &[ImageView<'_, u8>],
        spec: &DescriptorSpec,
        stride: usize,
    ) -> GckMatchResult<CoordinateMap> {
        let dense = DescriptorSet::extract(channels, spec)?;
        if stride == 1 {
            return self.match_descriptors(&dense);
        }
        self.match_descriptors(&dense.subsample(stride)?)
    }

    #[cfg(feature = "rayon")]
    fn descend_all(&self, queries: &DescriptorSet) -> GckMatchResult<Vec<Descent>> {
        if self.cfg.parallel {
            return crate::kernel::rayon::descend_all_par::<ActiveKernel>(&self.tree, queries);
        }
        descend_seq(&self.tree, queries)
    }

    #[cfg(not(feature = "rayon"))]
    fn descend_all(&self, queries: &DescriptorSet) -> GckMatchResult<Vec<Descent>> {
        descend_seq(&self.tree, queries)
    }
}

fn descend_seq(tree: &KdTree, queries: &DescriptorSet) -> GckMatchResult<Vec<Descent>> {
    queries
        .as_slice()
        .chunks_exact(queries.dims())
        .map(|q| descend::<ActiveKernel>(tree, q))
        .collect()
}
