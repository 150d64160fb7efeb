//! Randomized per-attempt object transform: aspect-preserving resize,
//! rotation about the cutout center, and brightness/contrast jitter.
//!
//! The scene builder talks to this through the [`ObjectTransformer`] trait;
//! [`RandomizedTransformer`] is the default implementation. Masks are
//! re-binarized after every step, so downstream code always sees {0, 1}.

use image::{GrayImage, RgbImage, imageops};
use rand::{Rng, RngCore};

use crate::{
    buffer::Cutout,
    error::{ScenesmithError, ScenesmithResult},
    scene::ObjectTransformer,
};

/// Bounds on the randomized resize: the transformed cutout's longest side
/// is drawn uniformly from `[longest_min, longest_max]`.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct SizeConstraints {
    pub longest_min: u32,
    pub longest_max: u32,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self {
            longest_min: 100,
            longest_max: 100,
        }
    }
}

impl SizeConstraints {
    pub fn validate(&self) -> ScenesmithResult<()> {
        if self.longest_min == 0 {
            return Err(ScenesmithError::validation("longest_min must be >= 1"));
        }
        if self.longest_min > self.longest_max {
            return Err(ScenesmithError::validation(
                "longest_min must be <= longest_max",
            ));
        }
        Ok(())
    }
}

/// Jitter ranges. Brightness is an additive offset in units of full scale,
/// contrast a multiplicative deviation around 1.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct AugmentationConfig {
    pub rotate_limit_deg: f64,
    pub brightness_min: f64,
    pub brightness_max: f64,
    pub contrast_limit: f64,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotate_limit_deg: 90.0,
            brightness_min: -0.1,
            brightness_max: 0.2,
            contrast_limit: 0.1,
        }
    }
}

impl AugmentationConfig {
    pub fn validate(&self) -> ScenesmithResult<()> {
        if !(0.0..=180.0).contains(&self.rotate_limit_deg) {
            return Err(ScenesmithError::validation(
                "rotate_limit_deg must be within [0, 180]",
            ));
        }
        if self.brightness_min > self.brightness_max {
            return Err(ScenesmithError::validation(
                "brightness_min must be <= brightness_max",
            ));
        }
        if self.contrast_limit < 0.0 {
            return Err(ScenesmithError::validation("contrast_limit must be >= 0"));
        }
        Ok(())
    }
}

pub struct RandomizedTransformer {
    size: SizeConstraints,
    aug: AugmentationConfig,
}

impl RandomizedTransformer {
    pub fn new(size: SizeConstraints, aug: AugmentationConfig) -> ScenesmithResult<Self> {
        size.validate()?;
        aug.validate()?;
        Ok(Self { size, aug })
    }
}

impl ObjectTransformer for RandomizedTransformer {
    fn transform(&self, source: &Cutout, rng: &mut dyn RngCore) -> ScenesmithResult<Cutout> {
        let target = rng.random_range(self.size.longest_min..=self.size.longest_max);
        let resized = resize_longest(source, target)?;

        let limit = self.aug.rotate_limit_deg;
        let angle = rng.random_range(-limit..=limit).to_radians();
        let rotated = rotate_about_center(&resized, angle)?;

        let offset = rng.random_range(self.aug.brightness_min..=self.aug.brightness_max);
        let gain = 1.0 + rng.random_range(-self.aug.contrast_limit..=self.aug.contrast_limit);
        Ok(jitter(rotated, gain, offset))
    }
}

/// Resize so the longest side equals `target`, keeping aspect ratio. The
/// image is filtered bilinearly; the mask uses nearest so it stays binary.
pub fn resize_longest(cutout: &Cutout, target: u32) -> ScenesmithResult<Cutout> {
    let long = cutout.width.max(cutout.height);
    if long == 0 || target == 0 {
        return Err(ScenesmithError::validation(
            "resize needs non-empty cutout and target",
        ));
    }
    let scale = f64::from(target) / f64::from(long);
    let (new_w, new_h) = if cutout.width >= cutout.height {
        (target, scaled_side(cutout.height, scale))
    } else {
        (scaled_side(cutout.width, scale), target)
    };

    let rgb = RgbImage::from_raw(cutout.width, cutout.height, cutout.rgb.clone())
        .ok_or_else(|| ScenesmithError::validation("cutout rgb buffer mismatch"))?;
    let mask = GrayImage::from_raw(cutout.width, cutout.height, cutout.mask.clone())
        .ok_or_else(|| ScenesmithError::validation("cutout mask buffer mismatch"))?;

    let rgb = imageops::resize(&rgb, new_w, new_h, imageops::FilterType::Triangle);
    let mask = imageops::resize(&mask, new_w, new_h, imageops::FilterType::Nearest);
    let mask = mask.into_raw().into_iter().map(|v| u8::from(v != 0)).collect();
    Cutout::new(new_w, new_h, rgb.into_raw(), mask)
}

fn scaled_side(side: u32, scale: f64) -> u32 {
    ((f64::from(side) * scale).round() as u32).max(1)
}

/// Rotate by `angle` radians about the cutout center into an expanded
/// bounding box, nearest-neighbor sampled. Pixels outside the source mask
/// stay transparent (mask 0, black).
pub fn rotate_about_center(cutout: &Cutout, angle: f64) -> ScenesmithResult<Cutout> {
    let (sin, cos) = angle.sin_cos();
    let w = f64::from(cutout.width);
    let h = f64::from(cutout.height);
    let new_w = rotated_extent(w * cos.abs() + h * sin.abs());
    let new_h = rotated_extent(w * sin.abs() + h * cos.abs());

    let src_cx = (w - 1.0) / 2.0;
    let src_cy = (h - 1.0) / 2.0;
    let dst_cx = (f64::from(new_w) - 1.0) / 2.0;
    let dst_cy = (f64::from(new_h) - 1.0) / 2.0;

    let px = (new_w as usize) * (new_h as usize);
    let mut rgb = vec![0u8; px * 3];
    let mut mask = vec![0u8; px];
    for y in 0..new_h {
        let dy = f64::from(y) - dst_cy;
        for x in 0..new_w {
            let dx = f64::from(x) - dst_cx;
            // inverse rotation back into source space
            let sx = (dx * cos + dy * sin + src_cx).round();
            let sy = (-dx * sin + dy * cos + src_cy).round();
            if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
                continue;
            }
            let si = (sy as usize) * cutout.width as usize + sx as usize;
            if cutout.mask[si] == 0 {
                continue;
            }
            let di = (y as usize) * new_w as usize + x as usize;
            rgb[di * 3..di * 3 + 3].copy_from_slice(&cutout.rgb[si * 3..si * 3 + 3]);
            mask[di] = 1;
        }
    }
    Cutout::new(new_w, new_h, rgb, mask)
}

// ceil with a tolerance so exact right angles do not grow by one pixel
fn rotated_extent(v: f64) -> u32 {
    ((v - 1e-9).ceil().max(1.0)) as u32
}

/// Apply `v' = clamp(v * gain + offset * 255)` to every channel.
pub fn jitter(mut cutout: Cutout, gain: f64, offset: f64) -> Cutout {
    let bias = offset * 255.0;
    for v in &mut cutout.rgb {
        *v = (f64::from(*v) * gain + bias).clamp(0.0, 255.0) as u8;
    }
    cutout
}
