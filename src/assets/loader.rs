//! Foreground asset loading.
//!
//! An object source is a color image plus a grayscale mask image of the
//! same dimensions. Pairs are discovered in a single directory by stem
//! suffix: `foo.png` pairs with `foo_mask.png` (any extension the `image`
//! crate decodes). Raw mask intensities are binarized at a threshold.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    buffer::Cutout,
    error::{ScenesmithError, ScenesmithResult},
};

/// Mask intensities at or below this count as background.
pub const DEFAULT_MASK_THRESHOLD: u8 = 10;

pub fn load_object(
    image_path: &Path,
    mask_path: &Path,
    mask_threshold: u8,
) -> ScenesmithResult<Cutout> {
    let rgb = image::open(image_path)
        .with_context(|| format!("open object image '{}'", image_path.display()))?
        .to_rgb8();
    let mask = image::open(mask_path)
        .with_context(|| format!("open object mask '{}'", mask_path.display()))?
        .to_luma8();

    if rgb.dimensions() != mask.dimensions() {
        return Err(ScenesmithError::validation(format!(
            "image '{}' and mask '{}' dimensions differ",
            image_path.display(),
            mask_path.display()
        )));
    }

    let (width, height) = rgb.dimensions();
    let binary = mask
        .into_raw()
        .into_iter()
        .map(|v| u8::from(v > mask_threshold))
        .collect();
    Cutout::new(width, height, rgb.into_raw(), binary)
}

/// Find all `(image, mask)` path pairs in `dir`, sorted by image path for
/// deterministic ordering.
pub fn discover_object_pairs(dir: &Path) -> ScenesmithResult<Vec<(PathBuf, PathBuf)>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read objects dir '{}'", dir.display()))?;

    let mut pairs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("read objects dir '{}'", dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        if stem.ends_with("_mask") {
            continue;
        }
        let mask = dir.join(format!("{stem}_mask.{ext}"));
        if mask.is_file() {
            pairs.push((path, mask));
        }
    }

    pairs.sort();
    if pairs.is_empty() {
        return Err(ScenesmithError::validation(format!(
            "no image/mask pairs found in '{}'",
            dir.display()
        )));
    }
    Ok(pairs)
}
