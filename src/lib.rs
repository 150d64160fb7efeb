//! Scenesmith synthesizes labeled object-detection training images.
//!
//! Each scene composites randomly transformed foreground cutouts onto a
//! background canvas while maintaining a per-pixel instance map, then
//! reduces that map to YOLO bounding-box annotations.
//!
//! # Pipeline overview
//!
//! 1. **Load**: foreground image/mask pairs ([`assets::loader`]) and a
//!    background canvas ([`assets::background`])
//! 2. **Build**: repeated sample -> transform -> overlay -> verify cycles
//!    with rollback under a retry budget ([`scene::build_scene`])
//! 3. **Annotate**: instance map -> normalized bounding boxes
//!    ([`annotate::extract`])
//! 4. **Write**: one raster image and one label file per scene
//!    ([`pipeline::generate_dataset`])
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Hard-masked compositing**: binary mask membership, no blending or
//!   anti-aliasing; later placements overwrite earlier ones.
//! - **Explicit randomness**: every random draw goes through a caller-owned
//!   seedable RNG; scenes parallelize over independent RNG streams.
//! - **Truncation is not failure**: a scene that exhausts its placement
//!   budget returns what it accepted so far as valid output.

#![forbid(unsafe_code)]

pub mod annotate;
pub mod assets;
pub mod buffer;
pub mod compositor;
pub mod error;
pub mod overlap;
pub mod pipeline;
pub mod sampler;
pub mod scene;
pub mod transform;

pub use annotate::{Annotation, extract};
pub use assets::{BackgroundSource, load_background};
pub use buffer::{Canvas, Cutout, InstanceMap, SceneSnapshot, SceneState};
pub use compositor::{AddedMask, ClipRect, clip_to_canvas, overlay};
pub use error::{ScenesmithError, ScenesmithResult};
pub use overlap::verify;
pub use pipeline::{DatasetConfig, DatasetStats, generate_dataset};
pub use sampler::sample_position;
pub use scene::{ObjectTransformer, SceneConfig, SceneOutput, build_scene, partition_groups};
pub use transform::{AugmentationConfig, RandomizedTransformer, SizeConstraints};
