//! Visibility policy for freshly composited placements.

use crate::buffer::InstanceMap;

/// Decide whether the most recent placement keeps every previously accepted
/// instance sufficiently visible.
///
/// - With no accepted instances yet, the answer is unconditionally `true`.
/// - Labels in the map must be contiguous: a previously accepted instance
///   that has been fully occluded fails immediately, regardless of the
///   threshold.
/// - Every accepted instance `i` with recorded area `A_i` and currently
///   visible pixel count `V_i` must satisfy `V_i / A_i >= 1 - max_overlap`.
pub fn verify(map: &InstanceMap, accepted_areas: &[u64], max_overlap: f64) -> bool {
    if accepted_areas.is_empty() {
        return true;
    }

    let visible = map.label_histogram();
    if visible.iter().any(|&v| v == 0) {
        return false;
    }

    for (i, &area) in accepted_areas.iter().enumerate() {
        let v = visible.get(i).copied().unwrap_or(0);
        if area == 0 || (v as f64) / (area as f64) < 1.0 - max_overlap {
            return false;
        }
    }
    true
}
