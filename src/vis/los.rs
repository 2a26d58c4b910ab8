//! Grid raster line-of-sight.
//!
//! This is a cheap visibility approximation for map reveal, not exact ray
//! casting: only Empty (solid rock) cells block the line, wall flags do not.

use glam::{IVec2, Vec2};

use crate::world::Dungeon;

/// Walk a straight line from `from` to `to` in uniform steps and report
/// whether it stays on walkable cells the whole way.
///
/// Coordinates are continuous grid positions; every sample (endpoints
/// included) is floored to a cell. Stepping off the grid counts as blocked.
pub fn is_visible(from: Vec2, to: Vec2, dungeon: &Dungeon) -> bool {
    let delta = to - from;
    let steps = (delta.x.abs() + delta.y.abs()).ceil() as i32;

    let increment = if steps > 0 {
        delta / steps as f32
    } else {
        Vec2::ZERO
    };

    let mut point = from;
    for _ in 0..=steps {
        let cell = IVec2::new(point.x.floor() as i32, point.y.floor() as i32);
        match dungeon.kind_at(cell) {
            None => return false,
            Some(kind) if !kind.walkable() => return false,
            Some(_) => {}
        }
        point += increment;
    }
    true
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CellKind;

    #[test]
    fn straight_corridor_is_visible() {
        let d = Dungeon::from_kinds(8, 8, |x, y| {
            if y == 0 && x <= 5 {
                CellKind::Corridor
            } else {
                CellKind::Empty
            }
        });
        assert!(is_visible(Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), &d));
    }

    #[test]
    fn one_empty_cell_blocks_the_line() {
        let d = Dungeon::from_kinds(8, 8, |x, y| {
            if y == 0 && x <= 5 && x != 3 {
                CellKind::Corridor
            } else {
                CellKind::Empty
            }
        });
        assert!(!is_visible(Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), &d));
    }

    #[test]
    fn same_cell_sees_itself() {
        let d = Dungeon::from_kinds(8, 8, |x, y| {
            if (x, y) == (2, 2) {
                CellKind::Room
            } else {
                CellKind::Empty
            }
        });
        assert!(is_visible(Vec2::new(2.0, 2.0), Vec2::new(2.0, 2.0), &d));
        assert!(!is_visible(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0), &d));
    }

    #[test]
    fn off_grid_targets_are_rejected() {
        let d = Dungeon::from_kinds(8, 8, |_, _| CellKind::Room);
        assert!(!is_visible(Vec2::new(2.0, 2.0), Vec2::new(20.0, 2.0), &d));
        assert!(!is_visible(Vec2::new(-3.0, 0.0), Vec2::new(2.0, 0.0), &d));
    }

    #[test]
    fn diagonal_line_through_rooms() {
        let d = Dungeon::from_kinds(8, 8, |_, _| CellKind::Room);
        assert!(is_visible(Vec2::new(0.0, 0.0), Vec2::new(6.0, 6.0), &d));
    }
}
