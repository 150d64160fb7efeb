//! Dataset generation: many independent scenes, one image and one YOLO
//! label file each.
//!
//! Scenes are embarrassingly parallel; parallelism is applied at whole-scene
//! granularity only, each scene running on its own RNG stream derived from
//! the base seed. Nothing is shared between in-flight scenes.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::{
    annotate,
    assets::{self, BackgroundSource},
    buffer::Cutout,
    error::{ScenesmithError, ScenesmithResult},
    scene::{self, SceneConfig},
    transform::{AugmentationConfig, RandomizedTransformer, SizeConstraints},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub num_images: u32,
    pub scene: SceneConfig,
    pub size: SizeConstraints,
    pub aug: AugmentationConfig,
    pub mask_threshold: u8,
    pub seed: u64,
    pub parallel: bool,
    pub threads: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            num_images: 100,
            scene: SceneConfig::default(),
            size: SizeConstraints::default(),
            aug: AugmentationConfig::default(),
            mask_threshold: assets::DEFAULT_MASK_THRESHOLD,
            seed: 0,
            parallel: false,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub scenes: u64,
    pub instances: u64,
    /// Scenes that ran out of placement attempts before reaching their
    /// requested object count. Still written out as valid samples.
    pub truncated: u64,
}

/// Generate `config.num_images` scenes into `out_dir/images` and
/// `out_dir/labels`. Filenames encode the scene index and the accepted
/// instance count (`scene_00003_n7.jpg` / `.txt`).
pub fn generate_dataset(
    objects_dir: &Path,
    background: &BackgroundSource,
    out_dir: &Path,
    config: &DatasetConfig,
) -> ScenesmithResult<DatasetStats> {
    config.scene.validate()?;
    let transformer = RandomizedTransformer::new(config.size, config.aug)?;

    let pairs = assets::discover_object_pairs(objects_dir)?;
    let sources: Vec<Cutout> = pairs
        .iter()
        .map(|(img, mask)| assets::load_object(img, mask, config.mask_threshold))
        .collect::<ScenesmithResult<_>>()?;
    tracing::info!(sources = sources.len(), "loaded foreground objects");

    let images_dir = out_dir.join("images");
    let labels_dir = out_dir.join("labels");
    for dir in [&images_dir, &labels_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
    }

    let run = |index: u32| {
        run_scene(
            index,
            background,
            &sources,
            &transformer,
            config,
            &images_dir,
            &labels_dir,
        )
    };

    let per_scene: Vec<SceneResult> = if config.parallel {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| ScenesmithError::validation(format!("build thread pool: {e}")))?;
        pool.install(|| {
            (0..config.num_images)
                .into_par_iter()
                .map(run)
                .collect::<ScenesmithResult<_>>()
        })?
    } else {
        (0..config.num_images)
            .map(run)
            .collect::<ScenesmithResult<_>>()?
    };

    let mut stats = DatasetStats::default();
    for r in &per_scene {
        stats.scenes += 1;
        stats.instances += r.accepted as u64;
        stats.truncated += u64::from(r.truncated);
    }
    tracing::info!(
        scenes = stats.scenes,
        instances = stats.instances,
        truncated = stats.truncated,
        "dataset generation finished"
    );
    Ok(stats)
}

struct SceneResult {
    accepted: usize,
    truncated: bool,
}

fn run_scene(
    index: u32,
    background: &BackgroundSource,
    sources: &[Cutout],
    transformer: &RandomizedTransformer,
    config: &DatasetConfig,
    images_dir: &Path,
    labels_dir: &Path,
) -> ScenesmithResult<SceneResult> {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(u64::from(index)));

    let canvas = assets::load_background(background, &mut rng)?;
    let out = scene::build_scene(canvas, sources, transformer, &config.scene, &mut rng)?;
    let annotations = annotate::extract(&out.map, &out.labels)?;

    let stem = format!("scene_{index:05}_n{}", out.accepted());
    let image_path = images_dir.join(format!("{stem}.jpg"));
    image::save_buffer_with_format(
        &image_path,
        &out.canvas.data,
        out.canvas.width,
        out.canvas.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Jpeg,
    )
    .with_context(|| format!("write image '{}'", image_path.display()))?;

    write_annotations(&labels_dir.join(format!("{stem}.txt")), &annotations)?;

    tracing::debug!(
        scene = index,
        accepted = out.accepted(),
        requested = out.requested,
        "scene written"
    );
    Ok(SceneResult {
        accepted: out.accepted(),
        truncated: (out.accepted() as u32) < out.requested,
    })
}

fn write_annotations(path: &Path, annotations: &[annotate::Annotation]) -> ScenesmithResult<()> {
    let mut text = String::new();
    for ann in annotations {
        text.push_str(&ann.yolo_line());
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("write labels '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_objects_dir(dir: &Path) {
        let img = image::RgbImage::from_pixel(12, 12, image::Rgb([180, 40, 40]));
        img.save(dir.join("obj.png")).unwrap();
        let mask = image::GrayImage::from_pixel(12, 12, image::Luma([255]));
        mask.save(dir.join("obj_mask.png")).unwrap();
    }

    fn small_config() -> DatasetConfig {
        DatasetConfig {
            num_images: 3,
            scene: SceneConfig {
                min_objects: 1,
                max_objects: 3,
                max_overlap: 0.3,
                max_attempts: 10,
            },
            size: SizeConstraints {
                longest_min: 6,
                longest_max: 10,
            },
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn writes_one_image_and_one_label_file_per_scene() {
        let objects = tempfile::tempdir().unwrap();
        seed_objects_dir(objects.path());
        let out = tempfile::tempdir().unwrap();

        let background = BackgroundSource::Flat {
            width: 64,
            height: 64,
        };
        let stats =
            generate_dataset(objects.path(), &background, out.path(), &small_config()).unwrap();

        assert_eq!(stats.scenes, 3);
        let images: Vec<_> = fs::read_dir(out.path().join("images"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        let labels: Vec<_> = fs::read_dir(out.path().join("labels"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(images.len(), 3);
        assert_eq!(labels.len(), 3);

        // label line count matches the instance count encoded in the name
        for label in labels {
            let stem = label.file_stem().unwrap().to_str().unwrap().to_string();
            let count: usize = stem.rsplit_once('n').unwrap().1.parse().unwrap();
            let lines = fs::read_to_string(&label).unwrap().lines().count();
            assert_eq!(lines, count);
        }
    }

    #[test]
    fn same_seed_gives_identical_stats() {
        let objects = tempfile::tempdir().unwrap();
        seed_objects_dir(objects.path());
        let background = BackgroundSource::Flat {
            width: 48,
            height: 48,
        };

        let out_a = tempfile::tempdir().unwrap();
        let out_b = tempfile::tempdir().unwrap();
        let config = small_config();
        let a = generate_dataset(objects.path(), &background, out_a.path(), &config).unwrap();
        let b = generate_dataset(objects.path(), &background, out_b.path(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_matches_sequential_output() {
        let objects = tempfile::tempdir().unwrap();
        seed_objects_dir(objects.path());
        let background = BackgroundSource::Flat {
            width: 48,
            height: 48,
        };

        let sequential = small_config();
        let parallel = DatasetConfig {
            parallel: true,
            threads: Some(2),
            ..small_config()
        };
        let out_a = tempfile::tempdir().unwrap();
        let out_b = tempfile::tempdir().unwrap();
        let a = generate_dataset(objects.path(), &background, out_a.path(), &sequential).unwrap();
        let b = generate_dataset(objects.path(), &background, out_b.path(), &parallel).unwrap();
        assert_eq!(a, b);
    }
}
