//! Incremental Walsh-Hadamard projection via Gray-code kernels.
//!
//! For an `S x S` kernel and `B` requested bases, every image position gets
//! the correlations with the first `B` Walsh filters of the zig-zag path.
//! The DC plane is a box sum; every later plane is derived from its
//! ancestor with a constant number of integer operations per sample, so the
//! whole transform is `O(W * H * B)` instead of `O(W * H * B * S^2)`.
//!
//! Planes are "full" correlations of size `(W + S - 1) x (H + S - 1)`:
//! plane sample `(j, i)` covers the window whose bottom-right corner is
//! image pixel `(j, i)`, with samples outside the image read as zero.
//! Only positions with `j, i >= S - 1` and `j <= W - 1`, `i <= H - 1` see a
//! window fully inside the image; those are the valid descriptors.

mod dc;
pub mod direct;
pub mod path;

use crate::descriptor::DescriptorSet;
use crate::image::ImageView;
use crate::trace::trace_span;
use crate::util::{GckMatchError, GckMatchResult};
use path::{Axis, GckPath, Step};

/// Largest supported kernel side; keeps every plane value inside `i32`.
pub const MAX_KERNEL_SIZE: usize = 256;

/// Parameters for the incremental transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GckConfig {
    /// Kernel side length `S` (power of two).
    pub kernel_size: usize,
    /// Number of bases `B` evaluated along the zig-zag path.
    pub bases: usize,
}

impl Default for GckConfig {
    fn default() -> Self {
        Self {
            kernel_size: 8,
            bases: 16,
        }
    }
}

/// Reusable transform: validated config plus the precomputed path table.
#[derive(Clone, Debug)]
pub struct GckTransform {
    config: GckConfig,
    path: GckPath,
}

impl GckTransform {
    /// Validates `config` and precomputes the derivation table.
    pub fn new(config: GckConfig) -> GckMatchResult<Self> {
        if config.kernel_size > MAX_KERNEL_SIZE {
            return Err(GckMatchError::InvalidKernelSize {
                kernel: config.kernel_size,
            });
        }
        let path = GckPath::new(config.kernel_size, config.bases)?;
        Ok(Self { config, path })
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> GckConfig {
        self.config
    }

    /// Returns the zig-zag path driving the transform.
    pub fn path(&self) -> &GckPath {
        &self.path
    }

    /// Computes all configured basis planes for a single-channel image.
    pub fn compute(&self, image: ImageView<'_, u8>) -> GckMatchResult<GckPlanes> {
        self.compute_bases(image, self.config.bases)
    }

    /// Computes only the first `bases` planes of the configured path.
    pub fn compute_bases(
        &self,
        image: ImageView<'_, u8>,
        bases: usize,
    ) -> GckMatchResult<GckPlanes> {
        let kernel = self.config.kernel_size;
        if bases == 0 || bases > self.path.len() {
            return Err(GckMatchError::InvalidBasisCount {
                bases,
                max: self.path.len(),
            });
        }
        let (w, h) = (image.width(), image.height());
        if kernel > w || kernel > h {
            return Err(GckMatchError::KernelTooLarge {
                kernel,
                width: w,
                height: h,
            });
        }

        let _span = trace_span!("gck_transform", width = w, height = h, kernel, bases).entered();

        let plane_w = w + kernel - 1;
        let plane_h = h + kernel - 1;
        let plane_len = plane_w * plane_h;
        let mut data = alloc_zeroed(plane_len * bases)?;

        let mut horiz = alloc_zeroed(plane_w * h)?;
        for y in 0..h {
            let row = image
                .row(y)
                .ok_or(GckMatchError::InvalidInput("image row out of range"))?;
            dc::box_sum_row(row, kernel, &mut horiz[y * plane_w..(y + 1) * plane_w]);
        }
        dc::box_sum_columns(&horiz, plane_w, kernel, &mut data[..plane_len]);
        drop(horiz);

        for (idx, entry) in self.path.entries().iter().enumerate().take(bases).skip(1) {
            let Some(step) = entry.step else {
                return Err(GckMatchError::InvalidInput("non-root basis without ancestor"));
            };
            let (head, tail) = data.split_at_mut(idx * plane_len);
            let prev = &head[step.ancestor * plane_len..(step.ancestor + 1) * plane_len];
            let cur = &mut tail[..plane_len];
            match step.axis {
                Axis::Horizontal => derive_rows(prev, cur, plane_w, step),
                Axis::Vertical => derive_columns(prev, cur, plane_w, step),
            }
        }

        Ok(GckPlanes {
            data,
            bases,
            kernel_size: kernel,
            image_width: w,
            image_height: h,
        })
    }
}

fn alloc_zeroed(len: usize) -> GckMatchResult<Vec<i32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| GckMatchError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<i32>()),
        })?;
    buf.resize(len, 0);
    Ok(buf)
}

// Shared recurrence along one axis. `back` is the sample `delta` earlier on
// the changed axis in the same plane.
#[inline(always)]
fn recur(prev_back: i32, cur_back: i32, prev_here: i32, flip: bool) -> i32 {
    if flip {
        prev_back - cur_back - prev_here
    } else {
        cur_back - prev_back - prev_here
    }
}

fn derive_rows(prev: &[i32], cur: &mut [i32], width: usize, step: Step) {
    let delta = step.delta;
    for (prev_row, cur_row) in prev.chunks_exact(width).zip(cur.chunks_exact_mut(width)) {
        for j in 0..delta {
            cur_row[j] = -prev_row[j];
        }
        for j in delta..width {
            cur_row[j] = recur(prev_row[j - delta], cur_row[j - delta], prev_row[j], step.flip);
        }
    }
}

fn derive_columns(prev: &[i32], cur: &mut [i32], width: usize, step: Step) {
    let offset = step.delta * width;
    for k in 0..offset.min(cur.len()) {
        cur[k] = -prev[k];
    }
    for k in offset..cur.len() {
        cur[k] = recur(prev[k - offset], cur[k - offset], prev[k], step.flip);
    }
}

/// Transform output: `B` planes of size `(W + S - 1) x (H + S - 1)`.
#[derive(Clone, Debug)]
pub struct GckPlanes {
    data: Vec<i32>,
    bases: usize,
    kernel_size: usize,
    image_width: usize,
    image_height: usize,
}

impl GckPlanes {
    /// Returns the number of computed planes.
    pub fn bases(&self) -> usize {
        self.bases
    }

    /// Returns the kernel side length.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Returns the plane width `W + S - 1`.
    pub fn width(&self) -> usize {
        self.image_width + self.kernel_size - 1
    }

    /// Returns the plane height `H + S - 1`.
    pub fn height(&self) -> usize {
        self.image_height + self.kernel_size - 1
    }

    /// Returns the source image dimensions.
    pub fn image_size(&self) -> (usize, usize) {
        (self.image_width, self.image_height)
    }

    /// Returns the width and height of the valid (fully covered) grid.
    pub fn valid_size(&self) -> (usize, usize) {
        (
            self.image_width - self.kernel_size + 1,
            self.image_height - self.kernel_size + 1,
        )
    }

    /// Returns plane `basis` in row-major order.
    pub fn plane(&self, basis: usize) -> Option<&[i32]> {
        let len = self.width() * self.height();
        self.data.get(basis * len..(basis + 1) * len)
    }

    /// Returns the coefficient of `basis` at plane coordinate `(x, y)`.
    pub fn value(&self, basis: usize, x: usize, y: usize) -> Option<i32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.plane(basis)?.get(y * self.width() + x).copied()
    }

    /// Collects the coefficients of every fully covered window.
    pub fn descriptors(&self) -> GckMatchResult<DescriptorSet> {
        let (vw, vh) = self.valid_size();
        let mut data = alloc_zeroed(vw * vh * self.bases)?;
        self.scatter_valid(&mut data, self.bases, 0);
        DescriptorSet::from_flat(data, self.bases, vw, vh)
    }

    /// Writes the `B` coefficients of every valid window into `out`.
    ///
    /// Windows are visited in raster order of their top-left corner; each
    /// contributes `B` values at `out[pos * dims + offset..]`.
    pub(crate) fn scatter_valid(&self, out: &mut [i32], dims: usize, offset: usize) {
        let (vw, vh) = self.valid_size();
        let pw = self.width();
        let len = pw * self.height();
        let k = self.kernel_size - 1;
        for b in 0..self.bases {
            let plane = &self.data[b * len..(b + 1) * len];
            for gy in 0..vh {
                let src = &plane[(gy + k) * pw + k..(gy + k) * pw + k + vw];
                for (gx, &v) in src.iter().enumerate() {
                    out[(gy * vw + gx) * dims + offset + b] = v;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GckConfig, GckTransform};
    use crate::image::ImageView;
    use crate::util::GckMatchError;

    #[test]
    fn dc_plane_is_window_sum() {
        let data: Vec<u8> = (0..16).collect();
        let img = ImageView::from_slice(&data, 4, 4).unwrap();
        let t = GckTransform::new(GckConfig {
            kernel_size: 2,
            bases: 1,
        })
        .unwrap();
        let planes = t.compute(img).unwrap();
        assert_eq!((planes.width(), planes.height()), (5, 5));
        // Window with bottom-right (1,1): 0 + 1 + 4 + 5.
        assert_eq!(planes.value(0, 1, 1), Some(10));
        assert_eq!(planes.value(0, 0, 0), Some(0));
        assert_eq!(planes.value(0, 4, 4), Some(15));
    }

    #[test]
    fn first_horizontal_basis_is_left_minus_right() {
        let data = [1u8, 5, 2, 7];
        let img = ImageView::from_slice(&data, 2, 2).unwrap();
        let t = GckTransform::new(GckConfig {
            kernel_size: 2,
            bases: 3,
        })
        .unwrap();
        let planes = t.compute(img).unwrap();
        // Basis 1 is (0,1): top minus bottom; basis 2 is (1,0): left minus right.
        assert_eq!(planes.value(1, 1, 1), Some(1 + 5 - 2 - 7));
        assert_eq!(planes.value(2, 1, 1), Some(1 + 2 - 5 - 7));
    }

    #[test]
    fn kernel_larger_than_image_is_rejected() {
        let data = [0u8; 12];
        let img = ImageView::from_slice(&data, 4, 3).unwrap();
        let t = GckTransform::new(GckConfig {
            kernel_size: 4,
            bases: 4,
        })
        .unwrap();
        assert_eq!(
            t.compute(img).err(),
            Some(GckMatchError::KernelTooLarge {
                kernel: 4,
                width: 4,
                height: 3
            })
        );
    }

    #[test]
    fn oversized_kernel_config_is_rejected() {
        let err = GckTransform::new(GckConfig {
            kernel_size: 512,
            bases: 1,
        })
        .err();
        assert_eq!(err, Some(GckMatchError::InvalidKernelSize { kernel: 512 }));
    }
}
