//! Query reconstruction from a coordinate map, and change detection.
//!
//! Each map entry names a reference window for one query position. The
//! reconstruction copies reference pixels to the query position; comparing
//! the result with the actual query exposes regions the reference cannot
//! explain.

use crate::image::{ImageView, OwnedImage};
use crate::search::CoordinateMap;
use crate::util::{GckMatchError, GckMatchResult};

/// How reference content is placed at each query position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconstructMode {
    /// Copy the source window's top-left pixel only.
    Pixel,
    /// Copy the full `S x S` source window; later positions overwrite.
    #[default]
    Block,
    /// Blend overlapping windows with weights `1 / (1 + d)` to each
    /// window centre.
    Blend,
}

/// Rebuilds a `width x height` query image from reference windows.
///
/// Query grid position `(gx, gy)` maps to pixel [`CoordinateMap::origin`].
/// A block grid snaps its last row and column to the image border, so
/// `Block` and `Blend` cover every pixel of a query the map was built
/// from. Pixels no window covers (gaps in `Pixel` mode) stay zero.
pub fn reconstruct(
    reference: ImageView<'_, u8>,
    map: &CoordinateMap,
    kernel_size: usize,
    mode: ReconstructMode,
    width: usize,
    height: usize,
) -> GckMatchResult<OwnedImage> {
    if kernel_size == 0 {
        return Err(GckMatchError::InvalidKernelSize { kernel: 0 });
    }
    for c in map.entries() {
        if c.x + kernel_size > reference.width() || c.y + kernel_size > reference.height() {
            return Err(GckMatchError::RoiOutOfBounds {
                x: c.x,
                y: c.y,
                width: kernel_size,
                height: kernel_size,
                img_width: reference.width(),
                img_height: reference.height(),
            });
        }
    }
    let mut out = OwnedImage::filled(width, height, 0)?;
    match mode {
        ReconstructMode::Pixel => place_pixels(reference, map, &mut out),
        ReconstructMode::Block => place_blocks(reference, map, kernel_size, &mut out),
        ReconstructMode::Blend => blend_blocks(reference, map, kernel_size, &mut out),
    }
    Ok(out)
}

fn positions(map: &CoordinateMap) -> impl Iterator<Item = (usize, usize, usize, usize)> + '_ {
    let w = map.width();
    map.entries().iter().enumerate().map(move |(i, c)| {
        let (qx, qy) = map.origin(i % w, i / w);
        (qx, qy, c.x, c.y)
    })
}

fn place_pixels(reference: ImageView<'_, u8>, map: &CoordinateMap, out: &mut OwnedImage) {
    let (w, h) = (out.width(), out.height());
    let data = out.data_mut();
    for (qx, qy, sx, sy) in positions(map) {
        if qx < w && qy < h {
            if let Some(&v) = reference.get(sx, sy) {
                data[qy * w + qx] = v;
            }
        }
    }
}

fn place_blocks(reference: ImageView<'_, u8>, map: &CoordinateMap, kernel: usize, out: &mut OwnedImage) {
    let (w, h) = (out.width(), out.height());
    let data = out.data_mut();
    for (qx, qy, sx, sy) in positions(map) {
        if qx >= w || qy >= h {
            continue;
        }
        let cols = kernel.min(w - qx);
        for dy in 0..kernel.min(h - qy) {
            let Some(src) = reference.row(sy + dy) else {
                continue;
            };
            let dst = (qy + dy) * w + qx;
            data[dst..dst + cols].copy_from_slice(&src[sx..sx + cols]);
        }
    }
}

fn blend_blocks(reference: ImageView<'_, u8>, map: &CoordinateMap, kernel: usize, out: &mut OwnedImage) {
    let (w, h) = (out.width(), out.height());
    let mut acc = vec![0.0f64; w * h];
    let mut weight = vec![0.0f64; w * h];
    let centre = (kernel as f64 - 1.0) / 2.0;
    let weights: Vec<f64> = (0..kernel * kernel)
        .map(|i| {
            let (dx, dy) = ((i % kernel) as f64 - centre, (i / kernel) as f64 - centre);
            1.0 / (1.0 + dx.hypot(dy))
        })
        .collect();

    for (qx, qy, sx, sy) in positions(map) {
        if qx >= w || qy >= h {
            continue;
        }
        for dy in 0..kernel.min(h - qy) {
            let Some(src) = reference.row(sy + dy) else {
                continue;
            };
            for dx in 0..kernel.min(w - qx) {
                let k = weights[dy * kernel + dx];
                let o = (qy + dy) * w + qx + dx;
                acc[o] += k * f64::from(src[sx + dx]);
                weight[o] += k;
            }
        }
    }

    for ((px, &a), &k) in out.data_mut().iter_mut().zip(&acc).zip(&weight) {
        if k > 0.0 {
            *px = (a / k).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Summary of a change map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeStats {
    /// Sum of absolute differences.
    pub sum: u64,
    /// Mean absolute difference per pixel.
    pub mean: f64,
    /// Largest absolute difference.
    pub max: u8,
}

impl ChangeStats {
    /// Computes statistics over a difference image.
    pub fn from_diff(diff: &OwnedImage) -> Self {
        let sum: u64 = diff.data().iter().map(|&v| u64::from(v)).sum();
        let max = diff.data().iter().copied().max().unwrap_or(0);
        Self {
            sum,
            mean: sum as f64 / diff.data().len() as f64,
            max,
        }
    }
}

/// Per-pixel absolute difference between a query and its reconstruction.
pub fn change_map(query: ImageView<'_, u8>, reconstruction: ImageView<'_, u8>) -> GckMatchResult<OwnedImage> {
    if query.width() != reconstruction.width() || query.height() != reconstruction.height() {
        return Err(GckMatchError::InvalidDimensions {
            width: reconstruction.width(),
            height: reconstruction.height(),
        });
    }
    let mut data = Vec::with_capacity(query.width() * query.height());
    for y in 0..query.height() {
        let (Some(a), Some(b)) = (query.row(y), reconstruction.row(y)) else {
            return Err(GckMatchError::InvalidInput("row outside image"));
        };
        data.extend(a.iter().zip(b).map(|(&p, &q)| p.abs_diff(q)));
    }
    OwnedImage::new(data, query.width(), query.height())
}

#[cfg(test)]
mod tests {
    use super::{change_map, reconstruct, ChangeStats, ReconstructMode};
    use crate::descriptor::DescriptorSet;
    use crate::image::{ImageView, OwnedImage};
    use crate::index::{BuildConfig, KdTree};
    use crate::search::{MatchConfig, Matcher};

    // Maps a 2x2 query grid (step 2) to fixed reference windows by exact
    // one-dimensional descriptors.
    fn swapped_map() -> crate::search::CoordinateMap {
        let reference = DescriptorSet::from_flat((0..9).collect(), 1, 3, 3).unwrap();
        let tree = KdTree::build(reference, BuildConfig::default()).unwrap();
        let matcher = Matcher::new(tree).with_config(MatchConfig {
            coherence: false,
            ..MatchConfig::default()
        });
        // Sources (2,0) (0,0) / (0,2) (2,2).
        let dense = DescriptorSet::from_flat(vec![2, 0, 0, 0, 0, 0, 6, 0, 8], 1, 3, 3).unwrap();
        let queries = dense.subsample(2).unwrap();
        matcher.match_descriptors(&queries).unwrap()
    }

    fn reference() -> OwnedImage {
        OwnedImage::new((0..16).collect(), 4, 4).unwrap()
    }

    #[test]
    fn block_mode_copies_windows() {
        let map = swapped_map();
        let r = reference();
        let out = reconstruct(r.view(), &map, 2, ReconstructMode::Block, 4, 4).unwrap();
        assert_eq!(
            out.data(),
            &[2, 3, 0, 1, 6, 7, 4, 5, 8, 9, 10, 11, 12, 13, 14, 15]
        );
    }

    #[test]
    fn pixel_mode_leaves_gaps() {
        let map = swapped_map();
        let r = reference();
        let out = reconstruct(r.view(), &map, 2, ReconstructMode::Pixel, 4, 4).unwrap();
        assert_eq!(out.data()[0], 2);
        assert_eq!(out.data()[2], 0);
        assert_eq!(out.data()[10], 10);
        assert_eq!(out.data()[1], 0);
    }

    #[test]
    fn blend_of_disjoint_blocks_equals_block_copy() {
        let map = swapped_map();
        let r = reference();
        let block = reconstruct(r.view(), &map, 2, ReconstructMode::Block, 4, 4).unwrap();
        let blend = reconstruct(r.view(), &map, 2, ReconstructMode::Blend, 4, 4).unwrap();
        assert_eq!(block, blend);
    }

    #[test]
    fn change_map_is_absolute_difference() {
        let a = [10u8, 0, 255, 7];
        let b = [0u8, 10, 250, 7];
        let va = ImageView::from_slice(&a, 2, 2).unwrap();
        let vb = ImageView::from_slice(&b, 2, 2).unwrap();
        let diff = change_map(va, vb).unwrap();
        assert_eq!(diff.data(), &[10, 10, 5, 0]);
        let stats = ChangeStats::from_diff(&diff);
        assert_eq!((stats.sum, stats.max), (25, 10));
        assert_eq!(stats.mean, 6.25);
    }

    #[test]
    fn sources_outside_reference_are_rejected() {
        let map = swapped_map();
        let small = OwnedImage::new(vec![0; 9], 3, 3).unwrap();
        assert!(reconstruct(small.view(), &map, 2, ReconstructMode::Block, 4, 4).is_err());
    }
}
