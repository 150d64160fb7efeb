use crate::error::{ScenesmithError, ScenesmithResult};

/// RGB8 pixel buffer, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Canvas {
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let px = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(px * 3);
        for _ in 0..px {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> ScenesmithResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| ScenesmithError::validation("canvas size overflow"))?;
        if data.len() != expected {
            return Err(ScenesmithError::validation(
                "canvas data must match width*height*3",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Per-pixel instance labels: 0 is background, k > 0 means "owned by the
/// k-th accepted instance". Later placements overwrite earlier ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
}

impl InstanceMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize)],
        }
    }

    pub fn label_at(&self, x: u32, y: u32) -> u16 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn max_label(&self) -> u16 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Visible pixel counts per label, indexed by `label - 1`, covering
    /// labels `1..=max_label`. A zero entry means the label is absent.
    pub fn label_histogram(&self) -> Vec<u64> {
        let mut counts: Vec<u64> = Vec::new();
        for &label in &self.data {
            if label == 0 {
                continue;
            }
            let idx = (label - 1) as usize;
            if idx >= counts.len() {
                counts.resize(idx + 1, 0);
            }
            counts[idx] += 1;
        }
        counts
    }
}

/// One placeable foreground: RGB pixels plus a same-shape mask in {0, 1}.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cutout {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub mask: Vec<u8>,
}

impl Cutout {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>, mask: Vec<u8>) -> ScenesmithResult<Self> {
        let px = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| ScenesmithError::validation("cutout size overflow"))?;
        if rgb.len() != px * 3 {
            return Err(ScenesmithError::validation(
                "cutout rgb must match width*height*3",
            ));
        }
        if mask.len() != px {
            return Err(ScenesmithError::validation(
                "cutout mask must match width*height",
            ));
        }
        Ok(Self {
            width,
            height,
            rgb,
            mask,
        })
    }

    pub fn mask_area(&self) -> u64 {
        self.mask.iter().filter(|&&m| m != 0).count() as u64
    }
}

/// The canvas and its instance map advance and roll back as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneState {
    pub canvas: Canvas,
    pub map: InstanceMap,
}

impl SceneState {
    pub fn new(canvas: Canvas) -> Self {
        let map = InstanceMap::new(canvas.width, canvas.height);
        Self { canvas, map }
    }

    /// Pre-attempt copy for rollback. Placement attempts mutate in place;
    /// a rejected attempt must be undone with [`SceneState::restore`].
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            canvas: self.canvas.clone(),
            map: self.map.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: SceneSnapshot) {
        self.canvas = snapshot.canvas;
        self.map = snapshot.map;
    }
}

/// Opaque saved state; produced by [`SceneState::snapshot`].
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    canvas: Canvas,
    map: InstanceMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(Canvas::from_raw(2, 2, vec![0; 11]).is_err());
        assert!(Canvas::from_raw(2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn filled_sets_every_pixel() {
        let c = Canvas::filled(3, 2, [1, 2, 3]);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(c.pixel(x, y), [1, 2, 3]);
            }
        }
    }

    #[test]
    fn histogram_counts_labels_and_flags_gaps() {
        let mut map = InstanceMap::new(4, 1);
        map.data = vec![0, 1, 3, 3];
        assert_eq!(map.label_histogram(), vec![1, 0, 2]);
        assert_eq!(map.max_label(), 3);
    }

    #[test]
    fn cutout_validates_both_buffers() {
        assert!(Cutout::new(2, 2, vec![0; 12], vec![0; 4]).is_ok());
        assert!(Cutout::new(2, 2, vec![0; 12], vec![0; 3]).is_err());
        assert!(Cutout::new(2, 2, vec![0; 11], vec![0; 4]).is_err());
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut state = SceneState::new(Canvas::filled(2, 2, [7, 7, 7]));
        let snap = state.snapshot();
        state.canvas.data[0] = 0;
        state.map.data[3] = 5;
        state.restore(snap);
        assert_eq!(state, SceneState::new(Canvas::filled(2, 2, [7, 7, 7])));
    }
}
