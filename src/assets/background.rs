//! Background canvas sources.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbImage;
use rand::Rng;

use crate::{
    buffer::Canvas,
    error::{ScenesmithError, ScenesmithResult},
};

/// Where a scene's canvas comes from.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundSource {
    /// One image file, used as-is.
    Fixed { path: PathBuf },
    /// One image file, resized so its long side equals `desired_max`; the
    /// short side keeps the aspect ratio unless `desired_min` is given.
    Resized {
        path: PathBuf,
        desired_max: u32,
        desired_min: Option<u32>,
    },
    /// A random image file from a directory, redrawn each scene.
    RandomDir { dir: PathBuf },
    /// A flat canvas of the given size, filled with a random color each
    /// scene.
    Flat { width: u32, height: u32 },
}

pub fn load_background<R: Rng + ?Sized>(
    source: &BackgroundSource,
    rng: &mut R,
) -> ScenesmithResult<Canvas> {
    match source {
        BackgroundSource::Fixed { path } => canvas_from_file(path),
        BackgroundSource::Resized {
            path,
            desired_max,
            desired_min,
        } => {
            let img = open_rgb(path)?;
            canvas_from_image(resize_long_side(&img, *desired_max, *desired_min))
        }
        BackgroundSource::RandomDir { dir } => {
            let files = list_image_files(dir)?;
            canvas_from_file(&files[rng.random_range(0..files.len())])
        }
        BackgroundSource::Flat { width, height } => {
            if *width == 0 || *height == 0 {
                return Err(ScenesmithError::validation(
                    "flat background needs non-zero dimensions",
                ));
            }
            let color = [rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()];
            Ok(Canvas::filled(*width, *height, color))
        }
    }
}

fn open_rgb(path: &Path) -> ScenesmithResult<RgbImage> {
    Ok(image::open(path)
        .with_context(|| format!("open background '{}'", path.display()))?
        .to_rgb8())
}

fn canvas_from_file(path: &Path) -> ScenesmithResult<Canvas> {
    canvas_from_image(open_rgb(path)?)
}

fn canvas_from_image(img: RgbImage) -> ScenesmithResult<Canvas> {
    let (width, height) = img.dimensions();
    Canvas::from_raw(width, height, img.into_raw())
}

/// Resize so the long side equals `desired_max`. The short side keeps the
/// original aspect ratio unless `desired_min` overrides it.
pub fn resize_long_side(img: &RgbImage, desired_max: u32, desired_min: Option<u32>) -> RgbImage {
    let (width, height) = img.dimensions();
    let long = width.max(height);
    let short = width.min(height);

    let long_new = desired_max.max(1);
    let short_new = desired_min.unwrap_or_else(|| {
        (((u64::from(short) * u64::from(long_new)) / u64::from(long.max(1))) as u32).max(1)
    });
    let (new_w, new_h) = if height > width {
        (short_new, long_new)
    } else {
        (long_new, short_new)
    };
    image::imageops::resize(img, new_w, new_h, image::imageops::FilterType::Triangle)
}

fn list_image_files(dir: &Path) -> ScenesmithResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("read backgrounds dir '{}'", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(ScenesmithError::validation(format!(
            "no background images in '{}'",
            dir.display()
        )));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn flat_background_has_one_color_everywhere() {
        let mut rng = StdRng::seed_from_u64(2);
        let canvas = load_background(
            &BackgroundSource::Flat {
                width: 8,
                height: 4,
            },
            &mut rng,
        )
        .unwrap();
        let first = canvas.pixel(0, 0);
        for y in 0..4 {
            for x in 0..8 {
                assert_eq!(canvas.pixel(x, y), first);
            }
        }
    }

    #[test]
    fn flat_background_rejects_zero_size() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(
            load_background(
                &BackgroundSource::Flat {
                    width: 0,
                    height: 4
                },
                &mut rng
            )
            .is_err()
        );
    }

    #[test]
    fn resize_long_side_keeps_aspect_by_default() {
        let img = RgbImage::new(400, 100);
        let out = resize_long_side(&img, 200, None);
        assert_eq!(out.dimensions(), (200, 50));

        let portrait = RgbImage::new(100, 400);
        let out = resize_long_side(&portrait, 200, None);
        assert_eq!(out.dimensions(), (50, 200));
    }

    #[test]
    fn resize_long_side_honors_explicit_short_side() {
        let img = RgbImage::new(400, 100);
        let out = resize_long_side(&img, 200, Some(80));
        assert_eq!(out.dimensions(), (200, 80));
    }

    #[test]
    fn fixed_background_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        RgbImage::from_pixel(6, 3, image::Rgb([1, 2, 3]))
            .save(&path)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let canvas = load_background(&BackgroundSource::Fixed { path }, &mut rng).unwrap();
        assert_eq!((canvas.width, canvas.height), (6, 3));
        assert_eq!(canvas.pixel(5, 2), [1, 2, 3]);
    }

    #[test]
    fn random_dir_draws_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png"] {
            RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]))
                .save(dir.path().join(name))
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        let canvas = load_background(
            &BackgroundSource::RandomDir {
                dir: dir.path().to_path_buf(),
            },
            &mut rng,
        )
        .unwrap();
        assert_eq!((canvas.width, canvas.height), (2, 2));
    }
}
