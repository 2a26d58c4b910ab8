//! Per-frame visibility sweep over the cell grid.
//!
//! Every cell's frustum test is independent, so the classify pass fans out
//! over grid rows with rayon and the per-row results are merged by the
//! collect. The only mutation – setting `uncovered` flags – happens in the
//! serial [`reveal`] pass afterwards, so the parallel part stays read-only.

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use super::frustum::{BoxTest, Frustum};
use super::los::is_visible;
use crate::world::Dungeon;

/// Render half-extents of one cell: floor tile plus full wall height.
pub const CELL_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 2.5, 0.5);

/// Default draw-distance cap, in cells.
pub const MAX_DRAW_DISTANCE: f32 = 16.0;

/// One cell that survived distance and frustum culling.
#[derive(Debug, Clone, Copy)]
pub struct VisibleCell {
    pub x: usize,
    pub y: usize,
    pub test: BoxTest,
}

/// World-space center of a cell; the grid lies in the XZ plane.
#[inline(always)]
pub fn world_pos(x: usize, y: usize) -> Vec3 {
    Vec3::new(x as f32, 0.0, y as f32)
}

/// Classify every non-Empty cell against the eye distance cap and the
/// frustum. Eye height is ignored for the distance cap, matching a viewer
/// gliding over the floor plane.
pub fn visible_cells(
    dungeon: &Dungeon,
    frustum: &Frustum,
    eye: Vec3,
    max_distance: f32,
) -> Vec<VisibleCell> {
    let flat_eye = Vec3::new(eye.x, 0.0, eye.z);

    (0..dungeon.height())
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..dungeon.width()).filter_map(move |x| {
                if !dungeon.kind(x, y).walkable() {
                    return None;
                }
                let pos = world_pos(x, y);
                if pos.distance(flat_eye) > max_distance {
                    return None;
                }
                let test = frustum.test_box(pos, CELL_HALF_EXTENTS);
                if test.is_empty() {
                    return None;
                }
                Some(VisibleCell { x, y, test })
            })
        })
        .collect()
}

/// Mark every classified cell that is also line-of-sight reachable from the
/// eye's cell as uncovered. Returns how many cells were newly revealed.
pub fn reveal(dungeon: &mut Dungeon, eye: Vec3, visible: &[VisibleCell]) -> usize {
    let origin = Vec2::new(eye.x.round(), eye.z.round());
    let mut newly = 0;
    for vc in visible {
        if dungeon.cell(vc.x, vc.y).uncovered {
            continue;
        }
        if is_visible(origin, Vec2::new(vc.x as f32, vc.y as f32), dungeon) {
            dungeon.uncover(vc.x, vc.y);
            newly += 1;
        }
    }
    newly
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CellKind;
    use glam::Mat4;

    /// Frustum that contains everything within a generous radius.
    fn wide_open() -> Frustum {
        let mut f = Frustum::default();
        // Orthographic volume big enough to hold the whole test grid.
        f.update(Mat4::orthographic_rh(-100.0, 100.0, -100.0, 100.0, -100.0, 100.0));
        f
    }

    fn open_grid() -> Dungeon {
        Dungeon::from_kinds(16, 16, |x, y| {
            if x >= 8 && y == 0 {
                CellKind::Empty
            } else {
                CellKind::Room
            }
        })
    }

    #[test]
    fn empty_cells_never_classify() {
        let d = open_grid();
        let visible = visible_cells(&d, &wide_open(), world_pos(4, 4), 100.0);
        assert!(!visible.is_empty());
        assert!(visible.iter().all(|vc| d.kind(vc.x, vc.y).walkable()));
    }

    #[test]
    fn distance_cap_holds() {
        let d = open_grid();
        let eye = world_pos(0, 0);
        for vc in visible_cells(&d, &wide_open(), eye, 5.0) {
            assert!(world_pos(vc.x, vc.y).distance(eye) <= 5.0);
        }
    }

    #[test]
    fn degenerate_frustum_yields_nothing() {
        let d = open_grid();
        let mut f = Frustum::default();
        f.update(Mat4::ZERO);
        assert!(visible_cells(&d, &f, world_pos(4, 4), 100.0).is_empty());
    }

    #[test]
    fn reveal_is_monotonic_and_los_gated() {
        // Rooms on both sides of a full-height rock wall at x = 8.
        let mut d = Dungeon::from_kinds(16, 16, |x, _| {
            if x == 8 {
                CellKind::Empty
            } else {
                CellKind::Room
            }
        });
        let eye = world_pos(2, 8);
        let visible = visible_cells(&d, &wide_open(), eye, 100.0);
        let newly = reveal(&mut d, eye, &visible);
        assert!(newly > 0);

        // Nothing beyond the wall is revealed; everything revealed stays so.
        for y in 0..16 {
            for x in 9..16 {
                assert!(!d.cell(x, y).uncovered, "({x},{y}) behind the wall");
            }
        }
        let again = reveal(&mut d, eye, &visible);
        assert_eq!(again, 0);
        assert!(d.cell(2, 8).uncovered);
    }
}
