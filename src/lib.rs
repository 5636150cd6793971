//! GckMatch is a CPU-first dense patch correspondence library.
//!
//! Every `S x S` window of an image is projected onto the first `B`
//! Walsh-Hadamard bases with Gray-code kernels, at constant cost per basis
//! and pixel. Reference descriptors go into an adaptive k-d tree; query
//! descriptors are matched approximately by tree descent refined with the
//! spatial coherence of neighbouring windows. The resulting coordinate map
//! reconstructs the query from reference content, and the residual is a
//! change signal.
//!
//! Optional features: `rayon` (parallel tree descent), `simd` (vectorised
//! distance kernel), `image-io` (file loading via the `image` crate) and
//! `tracing` (spans around the heavy stages).

pub mod descriptor;
pub mod image;
pub mod index;
pub mod kernel;
pub mod lowlevel;
pub mod reconstruct;
pub mod search;
mod trace;
pub mod transform;
pub mod util;

pub use descriptor::{DescriptorSet, DescriptorSpec};
pub use image::{ImageView, OwnedImage};
pub use index::{BuildConfig, KdTree, Node, NodeId, TreeStats};
pub use reconstruct::{change_map, reconstruct, ChangeStats, ReconstructMode};
pub use search::saliency::{saliency, SaliencyMap};
pub use search::{CoordinateMap, Correspondence, MatchConfig, Matcher};
pub use transform::{GckConfig, GckPlanes, GckTransform};
pub use util::{GckMatchError, GckMatchResult};
