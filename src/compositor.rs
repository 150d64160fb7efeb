//! Hard-masked overlay of one foreground cutout onto the scene.
//!
//! The placement anchor `(x, y)` is the cutout's **top-left corner** in
//! canvas coordinates and may lie outside the canvas on any side; the
//! written region is the intersection of the cutout footprint with the
//! canvas, computed independently per axis. No blending: where the mask is
//! set, canvas pixels are replaced and the instance map takes the new id
//! (painter's algorithm).

use crate::buffer::{Cutout, SceneState};

/// Footprint/canvas intersection in both coordinate spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipRect {
    pub src_x: u32,
    pub src_y: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Interval intersection of `[at, at + len)` with `[0, bound)`.
/// Returns `(src_offset, dst_start, len)`.
fn axis_overlap(at: i64, len: u32, bound: u32) -> Option<(u32, u32, u32)> {
    let start = at.max(0);
    let end = (at + i64::from(len)).min(i64::from(bound));
    if start >= end {
        return None;
    }
    Some(((start - at) as u32, start as u32, (end - start) as u32))
}

pub fn clip_to_canvas(
    x: i64,
    y: i64,
    cutout_width: u32,
    cutout_height: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<ClipRect> {
    let (src_x, dst_x, width) = axis_overlap(x, cutout_width, canvas_width)?;
    let (src_y, dst_y, height) = axis_overlap(y, cutout_height, canvas_height)?;
    Some(ClipRect {
        src_x,
        src_y,
        dst_x,
        dst_y,
        width,
        height,
    })
}

/// The cutout mask restricted to the written intersection, kept for area
/// bookkeeping at acceptance time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl AddedMask {
    pub fn area(&self) -> u64 {
        self.data.iter().filter(|&&m| m != 0).count() as u64
    }
}

/// Overlay `cutout` at `(x, y)` writing pixels and instance labels in place.
///
/// Returns `None` on failure: either the footprint misses the canvas
/// entirely (no mutation occurred) or the placement was degenerate — after
/// writing, the maximum label in the map must equal `instance_id`, which
/// fails when no mask pixel landed inside the canvas. This function never
/// snapshots; callers own rollback via [`SceneState::snapshot`].
pub fn overlay(
    state: &mut SceneState,
    cutout: &Cutout,
    x: i64,
    y: i64,
    instance_id: u16,
) -> Option<AddedMask> {
    if instance_id == 0 {
        return None;
    }
    let clip = clip_to_canvas(
        x,
        y,
        cutout.width,
        cutout.height,
        state.canvas.width,
        state.canvas.height,
    )?;

    let mut added = vec![0u8; (clip.width as usize) * (clip.height as usize)];
    for row in 0..clip.height {
        let sy = (clip.src_y + row) as usize;
        let dy = (clip.dst_y + row) as usize;
        for col in 0..clip.width {
            let sx = (clip.src_x + col) as usize;
            let si = sy * cutout.width as usize + sx;
            if cutout.mask[si] == 0 {
                continue;
            }
            let dx = (clip.dst_x + col) as usize;
            let di = dy * state.canvas.width as usize + dx;
            state.canvas.data[di * 3..di * 3 + 3].copy_from_slice(&cutout.rgb[si * 3..si * 3 + 3]);
            state.map.data[di] = instance_id;
            added[(row * clip.width + col) as usize] = 1;
        }
    }

    if state.map.max_label() != instance_id {
        return None;
    }
    Some(AddedMask {
        width: clip.width,
        height: clip.height,
        data: added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Canvas;

    fn solid_cutout(width: u32, height: u32, rgb: [u8; 3]) -> Cutout {
        let px = (width * height) as usize;
        let mut data = Vec::with_capacity(px * 3);
        for _ in 0..px {
            data.extend_from_slice(&rgb);
        }
        Cutout::new(width, height, data, vec![1; px]).unwrap()
    }

    #[test]
    fn axis_overlap_covers_all_sign_cases() {
        // fully inside
        assert_eq!(axis_overlap(2, 3, 10), Some((0, 2, 3)));
        // negative anchor, partially inside
        assert_eq!(axis_overlap(-2, 5, 10), Some((2, 0, 3)));
        // overflowing the far edge
        assert_eq!(axis_overlap(8, 5, 10), Some((0, 8, 2)));
        // fully left / fully right
        assert_eq!(axis_overlap(-5, 5, 10), None);
        assert_eq!(axis_overlap(10, 5, 10), None);
    }

    #[test]
    fn overlay_fully_inside_writes_pixels_and_labels() {
        let mut state = SceneState::new(Canvas::filled(8, 8, [0, 0, 0]));
        let cut = solid_cutout(3, 2, [200, 10, 10]);

        let added = overlay(&mut state, &cut, 2, 3, 1).unwrap();
        assert_eq!(added.area(), 6);
        assert_eq!(state.canvas.pixel(2, 3), [200, 10, 10]);
        assert_eq!(state.canvas.pixel(4, 4), [200, 10, 10]);
        assert_eq!(state.map.label_at(2, 3), 1);
        assert_eq!(state.map.label_at(5, 3), 0);
    }

    #[test]
    fn overlay_touches_nothing_outside_the_intersection() {
        let before = SceneState::new(Canvas::filled(10, 10, [9, 9, 9]));
        let cut = solid_cutout(4, 4, [1, 2, 3]);

        // top-left anchored partially off the top-left corner
        let mut state = before.clone();
        let added = overlay(&mut state, &cut, -2, -2, 1).unwrap();
        assert_eq!(added.area(), 4);
        for y in 0..10u32 {
            for x in 0..10u32 {
                if x < 2 && y < 2 {
                    assert_eq!(state.canvas.pixel(x, y), [1, 2, 3]);
                    assert_eq!(state.map.label_at(x, y), 1);
                } else {
                    assert_eq!(state.canvas.pixel(x, y), before.canvas.pixel(x, y));
                    assert_eq!(state.map.label_at(x, y), 0);
                }
            }
        }
    }

    #[test]
    fn overlay_off_canvas_fails_without_mutation() {
        let before = SceneState::new(Canvas::filled(6, 6, [4, 4, 4]));
        let cut = solid_cutout(3, 3, [1, 1, 1]);

        let mut state = before.clone();
        assert!(overlay(&mut state, &cut, -10, 0, 1).is_none());
        assert!(overlay(&mut state, &cut, 0, 6, 1).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn overlay_respects_the_cutout_mask() {
        let mut state = SceneState::new(Canvas::filled(4, 4, [0, 0, 0]));
        let mut cut = solid_cutout(2, 2, [50, 60, 70]);
        cut.mask[0] = 0;

        let added = overlay(&mut state, &cut, 0, 0, 1).unwrap();
        assert_eq!(added.area(), 3);
        assert_eq!(state.canvas.pixel(0, 0), [0, 0, 0]);
        assert_eq!(state.map.label_at(0, 0), 0);
        assert_eq!(state.map.label_at(1, 0), 1);
    }

    #[test]
    fn overlay_degenerate_mask_region_is_a_failure() {
        // Only the all-zero half of the mask lands on the canvas, so the new
        // id never appears in the map and the guard must fire.
        let mut state = SceneState::new(Canvas::filled(4, 4, [0, 0, 0]));
        // mask rows are [0, 0, 1, 1]: only the right half carries pixels
        let mask = vec![0, 0, 1, 1, 0, 0, 1, 1];
        let cut = Cutout::new(4, 2, vec![255; 4 * 2 * 3], mask).unwrap();

        // anchored so only the empty left half intersects the canvas
        assert!(overlay(&mut state, &cut, 2, 0, 1).is_none());
    }

    #[test]
    fn later_overlay_wins_where_masks_overlap() {
        let mut state = SceneState::new(Canvas::filled(6, 6, [0, 0, 0]));
        let red = solid_cutout(3, 3, [255, 0, 0]);
        let blue = solid_cutout(3, 3, [0, 0, 255]);

        overlay(&mut state, &red, 0, 0, 1).unwrap();
        overlay(&mut state, &blue, 1, 1, 2).unwrap();
        assert_eq!(state.canvas.pixel(0, 0), [255, 0, 0]);
        assert_eq!(state.canvas.pixel(1, 1), [0, 0, 255]);
        assert_eq!(state.map.label_at(1, 1), 2);
        assert_eq!(state.map.label_at(0, 0), 1);
    }
}
