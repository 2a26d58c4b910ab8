use bitflags::bitflags;
use glam::IVec2;

/// What occupies one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellKind {
    /// Solid rock – never walkable, blocks line-of-sight.
    #[default]
    Empty,
    Corridor,
    Room,
}

impl CellKind {
    /// Anything that is not solid rock can be stood on.
    #[inline(always)]
    pub fn walkable(self) -> bool {
        self != CellKind::Empty
    }
}

bitflags! {
    /// Cardinal-direction bit set, used for both wall and door flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirSet: u8 {
        const NORTH = 0b0001;
        const SOUTH = 0b0010;
        const EAST  = 0b0100;
        const WEST  = 0b1000;
    }
}

/// Compass direction on the grid. North is `-y`, west is `-x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    North,
    South,
    East,
    West,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::North, Dir::South, Dir::East, Dir::West];

    #[inline]
    pub fn flag(self) -> DirSet {
        match self {
            Dir::North => DirSet::NORTH,
            Dir::South => DirSet::SOUTH,
            Dir::East => DirSet::EAST,
            Dir::West => DirSet::WEST,
        }
    }

    /// Grid offset of the neighbouring cell in this direction.
    #[inline]
    pub fn offset(self) -> IVec2 {
        match self {
            Dir::North => IVec2::new(0, -1),
            Dir::South => IVec2::new(0, 1),
            Dir::East => IVec2::new(1, 0),
            Dir::West => IVec2::new(-1, 0),
        }
    }
}

/// Smallest addressable unit of the dungeon.
///
/// `kind` is written once by the room/corridor painting phases; `walls` and
/// `doors` are recomputed wholesale by their derivation passes. `uncovered`
/// belongs to the visibility layer and is monotonic: once a cell has been
/// revealed it stays revealed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    pub kind: CellKind,
    pub walls: DirSet,
    pub doors: DirSet,
    pub uncovered: bool,
}

impl Cell {
    #[inline]
    pub fn has_door(&self) -> bool {
        !self.doors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_flags_are_distinct() {
        let mut all = DirSet::empty();
        for d in Dir::ALL {
            assert!(!all.intersects(d.flag()));
            all |= d.flag();
        }
        assert_eq!(all, DirSet::all());
    }

    #[test]
    fn has_door_tracks_flags() {
        let mut cell = Cell::default();
        assert!(!cell.has_door());
        cell.doors |= DirSet::SOUTH;
        assert!(cell.has_door());
    }

    #[test]
    fn offsets_are_unit_manhattan() {
        for d in Dir::ALL {
            let o = d.offset();
            assert_eq!(o.x.abs() + o.y.abs(), 1);
        }
    }
}
