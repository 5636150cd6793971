//! Dense descriptor sets built from transform planes.
//!
//! A descriptor is the vector of basis coefficients of one `S x S` window.
//! Multi-channel descriptors concatenate per-channel coefficients, each
//! channel with its own basis count (for example more luminance bases than
//! chroma bases). Sets are laid out row-major over the window grid with
//! `dims` contiguous `i32` values per window.

use crate::image::ImageView;
use crate::transform::{GckConfig, GckTransform};
use crate::util::{GckMatchError, GckMatchResult};

/// Kernel size and per-channel basis counts used to extract descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSpec {
    /// Kernel side length `S`.
    pub kernel_size: usize,
    /// Number of bases taken from each channel, in channel order.
    pub channel_bases: Vec<usize>,
}

impl DescriptorSpec {
    /// Single-channel spec with `bases` coefficients.
    pub fn single(kernel_size: usize, bases: usize) -> Self {
        Self {
            kernel_size,
            channel_bases: vec![bases],
        }
    }

    /// Total descriptor length across channels.
    pub fn dims(&self) -> usize {
        self.channel_bases.iter().sum()
    }
}

impl Default for DescriptorSpec {
    fn default() -> Self {
        let cfg = GckConfig::default();
        Self::single(cfg.kernel_size, cfg.bases)
    }
}

/// Row-major grid of fixed-length integer descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSet {
    data: Vec<i32>,
    dims: usize,
    width: usize,
    height: usize,
    step: usize,
    span: (usize, usize),
}

impl DescriptorSet {
    /// Extracts descriptors for every fully covered window of the channels.
    ///
    /// All channels must share dimensions. The grid is
    /// `(W - S + 1) x (H - S + 1)`, indexed by window top-left corner.
    pub fn extract(channels: &[ImageView<'_, u8>], spec: &DescriptorSpec) -> GckMatchResult<Self> {
        let first = channels
            .first()
            .ok_or(GckMatchError::InvalidInput("no channels supplied"))?;
        if channels.len() != spec.channel_bases.len() {
            return Err(GckMatchError::DimensionMismatch {
                expected: spec.channel_bases.len(),
                got: channels.len(),
            });
        }
        let (w, h) = (first.width(), first.height());
        if let Some(other) = channels
            .iter()
            .find(|c| c.width() != w || c.height() != h)
        {
            return Err(GckMatchError::InvalidDimensions {
                width: other.width(),
                height: other.height(),
            });
        }
        let max_bases = spec.channel_bases.iter().copied().max().unwrap_or(0);
        let transform = GckTransform::new(GckConfig {
            kernel_size: spec.kernel_size,
            bases: max_bases,
        })?;
        if spec.kernel_size > w || spec.kernel_size > h {
            return Err(GckMatchError::KernelTooLarge {
                kernel: spec.kernel_size,
                width: w,
                height: h,
            });
        }

        let dims = spec.dims();
        let (gw, gh) = (w - spec.kernel_size + 1, h - spec.kernel_size + 1);
        let len = gw * gh * dims;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| GckMatchError::AllocationFailed {
                bytes: len.saturating_mul(std::mem::size_of::<i32>()),
            })?;
        data.resize(len, 0);

        let mut offset = 0;
        for (channel, &bases) in channels.iter().zip(&spec.channel_bases) {
            let planes = transform.compute_bases(*channel, bases)?;
            planes.scatter_valid(&mut data, dims, offset);
            offset += bases;
        }

        Ok(Self {
            data,
            dims,
            width: gw,
            height: gh,
            step: 1,
            span: (gw, gh),
        })
    }

    /// Wraps a flat buffer of `width * height` descriptors.
    pub fn from_flat(data: Vec<i32>, dims: usize, width: usize, height: usize) -> GckMatchResult<Self> {
        if dims == 0 {
            return Err(GckMatchError::InvalidInput("descriptor dims must be non-zero"));
        }
        let needed = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(dims))
            .ok_or(GckMatchError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(GckMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            dims,
            width,
            height,
            step: 1,
            span: (width, height),
        })
    }

    /// Keeps every `stride`-th window along both axes, plus the last one.
    ///
    /// With `stride == S` this yields the block grid. When the grid extent
    /// is not a multiple of the stride, the final row and column snap to
    /// the last valid window so the blocks still reach the image border.
    pub fn subsample(&self, stride: usize) -> GckMatchResult<Self> {
        if stride == 0 {
            return Err(GckMatchError::InvalidInput("subsample stride must be non-zero"));
        }
        let width = sampled_len(self.width, stride);
        let height = sampled_len(self.height, stride);
        let mut data = Vec::new();
        data.try_reserve_exact(width * height * self.dims)
            .map_err(|_| GckMatchError::AllocationFailed {
                bytes: (width * height * self.dims).saturating_mul(std::mem::size_of::<i32>()),
            })?;
        for ny in 0..height {
            let gy = (ny * stride).min(self.height - 1);
            for nx in 0..width {
                let gx = (nx * stride).min(self.width - 1);
                let i = gy * self.width + gx;
                data.extend_from_slice(&self.data[i * self.dims..(i + 1) * self.dims]);
            }
        }
        Ok(Self {
            data,
            dims: self.dims,
            width,
            height,
            step: self.step * stride,
            span: self.span,
        })
    }

    /// Returns descriptor `index`.
    pub fn get(&self, index: usize) -> Option<&[i32]> {
        let start = index.checked_mul(self.dims)?;
        self.data.get(start..start + self.dims)
    }

    /// Returns the descriptor at grid position `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> Option<&[i32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.get(y * self.width + x)
    }

    /// Maps a descriptor index to the top-left image pixel of its window.
    pub fn location(&self, index: usize) -> (usize, usize) {
        let (gx, gy) = (index % self.width, index / self.width);
        grid_origin(gx, gy, self.step, self.span)
    }

    /// Returns the number of descriptors.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Returns `true` when the set holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the descriptor length.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Returns the grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel spacing between neighbouring grid positions.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Returns the number of dense window positions along each axis
    /// covered by this grid.
    pub fn span(&self) -> (usize, usize) {
        self.span
    }

    /// Returns all descriptors as one flat buffer.
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }
}

// Positions kept by sampling `len` entries every `stride`, last included.
fn sampled_len(len: usize, stride: usize) -> usize {
    if len == 0 {
        0
    } else {
        (len - 1).div_ceil(stride) + 1
    }
}

/// Top-left pixel of grid position `(gx, gy)` on a grid with spacing `step`
/// whose last row and column are clamped to the dense extent `span`.
pub(crate) fn grid_origin(
    gx: usize,
    gy: usize,
    step: usize,
    span: (usize, usize),
) -> (usize, usize) {
    (
        (gx * step).min(span.0.saturating_sub(1)),
        (gy * step).min(span.1.saturating_sub(1)),
    )
}
