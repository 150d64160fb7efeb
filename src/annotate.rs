//! Instance-map to YOLO bounding-box reduction.

use crate::{
    buffer::InstanceMap,
    error::{ScenesmithError, ScenesmithResult},
};

/// One normalized bounding-box record: class index plus center and size,
/// each in [0, 1], rounded to 5 decimals.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    pub class_index: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl Annotation {
    /// `<classIndex> <xc> <yc> <w> <h>` with fixed 5-decimal floats.
    pub fn yolo_line(&self) -> String {
        format!(
            "{} {:.5} {:.5} {:.5} {:.5}",
            self.class_index, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Reduce a finished instance map to one annotation per accepted instance.
///
/// `labels[i]` is the class label of instance `i + 1`. An instance with no
/// visible pixels at this point violates the continuity invariant the scene
/// builder maintained and is reported as a hard consistency error.
pub fn extract(map: &InstanceMap, labels: &[u16]) -> ScenesmithResult<Vec<Annotation>> {
    let count = labels.len();
    // (xmin, ymin, xmax, ymax) per instance, grown pixel by pixel
    let mut bounds: Vec<Option<(u32, u32, u32, u32)>> = vec![None; count];

    for y in 0..map.height {
        for x in 0..map.width {
            let label = map.label_at(x, y);
            if label == 0 {
                continue;
            }
            let idx = (label - 1) as usize;
            if idx >= count {
                return Err(ScenesmithError::consistency(format!(
                    "instance map label {label} exceeds the {count} accepted instances"
                )));
            }
            bounds[idx] = Some(match bounds[idx] {
                None => (x, y, x, y),
                Some((xmin, ymin, xmax, ymax)) => {
                    (xmin.min(x), ymin.min(y), xmax.max(x), ymax.max(y))
                }
            });
        }
    }

    let w = f64::from(map.width);
    let h = f64::from(map.height);
    let mut annotations = Vec::with_capacity(count);
    for (idx, bound) in bounds.iter().enumerate() {
        let Some((xmin, ymin, xmax, ymax)) = *bound else {
            return Err(ScenesmithError::consistency(format!(
                "accepted instance {} has no visible pixels at extraction",
                idx + 1
            )));
        };
        annotations.push(Annotation {
            class_index: u32::from(labels[idx]) - 1,
            x_center: round5(f64::from(xmin + xmax) / 2.0 / w),
            y_center: round5(f64::from(ymin + ymax) / 2.0 / h),
            width: round5(f64::from(xmax - xmin) / w),
            height: round5(f64::from(ymax - ymin) / h),
        });
    }
    Ok(annotations)
}

fn round5(v: f64) -> f64 {
    (v * 100_000.0).round() / 100_000.0
}
