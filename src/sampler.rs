//! Canvas-centered placement sampling.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{ScenesmithError, ScenesmithResult};

/// Draw a placement anchor (top-left) for the canvas: each coordinate comes
/// from `Normal(extent / 2, extent / 8)`, clamped to `[0, extent]` and
/// truncated to an integer. Stateless apart from the caller's RNG; retry
/// logic lives in the scene builder.
pub fn sample_position<R: Rng + ?Sized>(
    rng: &mut R,
    width: u32,
    height: u32,
) -> ScenesmithResult<(i64, i64)> {
    Ok((sample_axis(rng, width)?, sample_axis(rng, height)?))
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, extent: u32) -> ScenesmithResult<i64> {
    let extent = f64::from(extent);
    let normal = Normal::new(extent / 2.0, extent / 8.0)
        .map_err(|e| ScenesmithError::validation(format!("placement distribution: {e}")))?;
    Ok(normal.sample(rng).clamp(0.0, extent) as i64)
}
