//! Low-level building blocks for custom pipelines.
//!
//! These expose the basis path table, the direct reference convolution, the
//! dimension ranker and the distance kernels. Most users should prefer the
//! top-level `GckTransform`, `KdTree` and `Matcher` types.

pub use crate::index::rank_dimensions;
pub use crate::kernel::scalar::SquaredL2Scalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SquaredL2Simd;
pub use crate::kernel::{Descent, ScoreKernel, Scored};
pub use crate::transform::direct::{direct_plane, walsh_coefficient};
pub use crate::transform::path::{Axis, GckPath, PathEntry, Step};
pub use crate::transform::MAX_KERNEL_SIZE;
