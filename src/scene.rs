//! Scene construction: repeated sample -> transform -> overlay -> verify
//! cycles with rollback, under a per-unit retry budget.

use rand::{Rng, RngCore};

use crate::{
    buffer::{Canvas, Cutout, InstanceMap, SceneState},
    compositor, overlap,
    error::{ScenesmithError, ScenesmithResult},
    sampler,
};

/// All placed objects currently share one semantic class.
pub const OBJECT_CLASS_LABEL: u16 = 1;

/// How many objects a scene requests and how placements are policed.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneConfig {
    /// Inclusive lower bound on the requested object count.
    pub min_objects: u32,
    /// Inclusive upper bound on the requested object count.
    pub max_objects: u32,
    /// Maximum tolerated occlusion fraction of any accepted instance.
    pub max_overlap: f64,
    /// Placement attempts per unit before the whole scene is truncated.
    pub max_attempts: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            min_objects: 5,
            max_objects: 15,
            max_overlap: 0.2,
            max_attempts: 10,
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> ScenesmithResult<()> {
        if self.min_objects > self.max_objects {
            return Err(ScenesmithError::validation(
                "min_objects must be <= max_objects",
            ));
        }
        if self.max_objects > u32::from(u16::MAX) {
            return Err(ScenesmithError::validation(
                "max_objects exceeds the instance label range",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_overlap) {
            return Err(ScenesmithError::validation(
                "max_overlap must be within [0, 1]",
            ));
        }
        if self.max_attempts == 0 {
            return Err(ScenesmithError::validation("max_attempts must be >= 1"));
        }
        Ok(())
    }
}

/// Per-attempt randomized transform applied to a foreground source. The
/// builder only requires that a transform exists and yields a cutout of
/// some size; the default implementation lives in [`crate::transform`].
pub trait ObjectTransformer {
    fn transform(&self, source: &Cutout, rng: &mut dyn RngCore) -> ScenesmithResult<Cutout>;
}

/// A finished (possibly truncated) scene build.
#[derive(Clone, Debug)]
pub struct SceneOutput {
    pub canvas: Canvas,
    pub map: InstanceMap,
    /// Class label per accepted instance, indexed by `instance id - 1`.
    pub labels: Vec<u16>,
    /// Pixel area of each instance at the moment it was accepted.
    pub areas: Vec<u64>,
    /// The object count this scene asked for; `accepted() < requested`
    /// means the placement budget ran out and the scene was truncated.
    pub requested: u32,
}

impl SceneOutput {
    pub fn accepted(&self) -> usize {
        self.areas.len()
    }
}

/// Split `total` into exactly `groups` non-negative sizes summing to
/// `total`: each non-final size is drawn uniformly from the remaining
/// budget, the final group absorbs the rest. The remaining budget cannot go
/// negative since every draw is bounded by it; the saturating decrement
/// keeps that explicit.
pub fn partition_groups<R: Rng + ?Sized>(rng: &mut R, total: u32, groups: usize) -> Vec<u32> {
    if groups == 0 {
        return Vec::new();
    }
    let mut sizes = Vec::with_capacity(groups);
    let mut remaining = total;
    for _ in 0..groups - 1 {
        let take = rng.random_range(0..=remaining);
        sizes.push(take);
        remaining = remaining.saturating_sub(take);
    }
    sizes.push(remaining);
    sizes
}

/// Build one scene on `background`.
///
/// The requested object count is drawn from `[min_objects, max_objects]`
/// and partitioned across one group per draw from `sources`; each group
/// binds one source, re-transformed independently per attempt. Instance ids
/// are assigned contiguously from 1 as placements are accepted. When a
/// unit exhausts its attempt budget, the whole scene stops immediately and
/// whatever was accepted so far is returned as valid output.
pub fn build_scene<R: Rng>(
    background: Canvas,
    sources: &[Cutout],
    transformer: &dyn ObjectTransformer,
    config: &SceneConfig,
    rng: &mut R,
) -> ScenesmithResult<SceneOutput> {
    config.validate()?;
    if sources.is_empty() {
        return Err(ScenesmithError::validation(
            "build_scene needs at least one foreground source",
        ));
    }

    let requested = rng.random_range(config.min_objects..=config.max_objects);
    let group_sizes = partition_groups(rng, requested, sources.len());

    let mut state = SceneState::new(background);
    let mut labels: Vec<u16> = Vec::new();
    let mut areas: Vec<u64> = Vec::new();

    'scene: for &group_size in &group_sizes {
        let source = &sources[rng.random_range(0..sources.len())];
        for _ in 0..group_size {
            let trial_id = (areas.len() + 1) as u16;
            let mut accepted = false;
            for _ in 0..config.max_attempts {
                let (x, y) =
                    sampler::sample_position(rng, state.canvas.width, state.canvas.height)?;
                let cutout = transformer.transform(source, rng)?;
                let snapshot = state.snapshot();
                match compositor::overlay(&mut state, &cutout, x, y, trial_id) {
                    Some(added) if overlap::verify(&state.map, &areas, config.max_overlap) => {
                        areas.push(added.area());
                        labels.push(OBJECT_CLASS_LABEL);
                        accepted = true;
                        break;
                    }
                    _ => state.restore(snapshot),
                }
            }
            if !accepted {
                tracing::debug!(
                    accepted = areas.len(),
                    requested,
                    "placement budget exhausted, truncating scene"
                );
                break 'scene;
            }
        }
    }

    Ok(SceneOutput {
        canvas: state.canvas,
        map: state.map,
        labels,
        areas,
        requested,
    })
}
