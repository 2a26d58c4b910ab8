//! The dungeon grid and its generation phases.
//!
//! Generation is strictly sequential: rooms (which also builds the partition
//! tree and carves corridors) → walls → doors. Every later phase reads the
//! finished output of the one before it, so the phases are order-checked and
//! cannot be interleaved. Wall and door derivation are pure functions of the
//! kind grid and may be re-run; painting may not.

use glam::IVec2;
use log::{debug, warn};
use rand::Rng;
use smallvec::SmallVec;
use thiserror::Error;

use super::cell::{Cell, CellKind, Dir, DirSet};
use super::config::GenConfig;
use super::partition::{Partition, PartitionId, PartitionTree};

/// Grids smaller than this cannot hold a single inset room.
pub const MIN_GRID_DIMENSION: usize = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenerationError {
    /// Not even the forced-room fallback could place a room.
    #[error("generation produced no rooms")]
    NoRooms,

    #[error("grid {width}x{height} is below the minimum of {MIN_GRID_DIMENSION}")]
    BadDimensions { width: usize, height: usize },
}

/// Generation progress, used to reject out-of-order phase calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
enum Phase {
    New,
    Rooms,
    Walls,
    Doors,
}

/// Owns the cell grid and the partition tree.
#[derive(Debug)]
pub struct Dungeon {
    width: usize,
    height: usize,
    /// Row-major: `cells[y * width + x]`.
    cells: Vec<Cell>,
    tree: PartitionTree,
    phase: Phase,
}

impl Dungeon {
    /// Allocate an all-Empty grid. Dimensions are fixed for the lifetime of
    /// the dungeon.
    pub fn new(width: usize, height: usize) -> Result<Self, GenerationError> {
        if width < MIN_GRID_DIMENSION || height < MIN_GRID_DIMENSION {
            return Err(GenerationError::BadDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            tree: PartitionTree::default(),
            phase: Phase::New,
        })
    }

    /// Run every generation phase in order on a fresh grid.
    pub fn generate<R: Rng>(
        width: usize,
        height: usize,
        cfg: &GenConfig,
        rng: &mut R,
    ) -> Result<Self, GenerationError> {
        let mut dungeon = Self::new(width, height)?;
        dungeon.generate_rooms(cfg, rng)?;
        dungeon.generate_walls();
        dungeon.generate_doors();
        Ok(dungeon)
    }

    // ─────────────────────────── accessors ───────────────────────────

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tree(&self) -> &PartitionTree {
        &self.tree
    }

    /// Read access to one cell. Out-of-range coordinates are an invariant
    /// violation and abort with the offending pair.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        assert!(
            x < self.width && y < self.height,
            "cell ({x},{y}) outside {}x{} grid",
            self.width,
            self.height
        );
        &self.cells[y * self.width + x]
    }

    #[inline]
    pub fn kind(&self, x: usize, y: usize) -> CellKind {
        self.cell(x, y).kind
    }

    /// Graceful lookup for query layers that may step off the grid.
    #[inline]
    pub fn kind_at(&self, p: IVec2) -> Option<CellKind> {
        if p.x < 0 || p.y < 0 || p.x as usize >= self.width || p.y as usize >= self.height {
            return None;
        }
        Some(self.cells[p.y as usize * self.width + p.x as usize].kind)
    }

    /// Reveal a cell. Monotonic: revealed cells never flip back.
    #[inline]
    pub fn uncover(&mut self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "cell ({x},{y}) outside {}x{} grid",
            self.width,
            self.height
        );
        self.cells[y * self.width + x].uncovered = true;
    }

    /// Pick a room-bearing leaf uniformly at random. Zero rooms is a fatal
    /// generation outcome, reported instead of looping.
    pub fn random_room<R: Rng>(&self, rng: &mut R) -> Result<&Partition, GenerationError> {
        let rooms: Vec<PartitionId> = self
            .tree
            .leaves()
            .filter(|&id| self.tree.node(id).has_room)
            .collect();
        if rooms.is_empty() {
            return Err(GenerationError::NoRooms);
        }
        Ok(self.tree.node(rooms[rng.gen_range(0..rooms.len())]))
    }

    #[inline]
    fn set_kind(&mut self, x: usize, y: usize, kind: CellKind) {
        self.cells[y * self.width + x].kind = kind;
    }

    // ──────────────────────────────────────────────────────────────────
    //                      Phase 1 – rooms & corridors
    // ──────────────────────────────────────────────────────────────────

    /// Build the partition tree, paint rooms into selected leaves and carve
    /// the corridors that connect them.
    pub fn generate_rooms<R: Rng>(
        &mut self,
        cfg: &GenConfig,
        rng: &mut R,
    ) -> Result<(), GenerationError> {
        assert!(
            self.phase == Phase::New,
            "generate_rooms called twice (phase {:?})",
            self.phase
        );

        self.tree = PartitionTree::build(self.width as i32, self.height as i32, cfg, rng);
        debug!(
            "partition tree: {} nodes, {} leaves",
            self.tree.len(),
            self.tree.leaves().count()
        );

        let leaves: Vec<PartitionId> = self.tree.leaves().collect();
        let mut rooms = 0usize;
        for &id in &leaves {
            if rng.gen_range(0..100u32) < cfg.room_percent && self.paint_room(id, cfg) {
                rooms += 1;
            }
        }

        // Stochastic selection can come up empty; force one room so the
        // dungeon is always playable.
        if rooms == 0 {
            warn!("no rooms selected stochastically, forcing one");
            for &id in &leaves {
                if self.paint_room(id, cfg) {
                    rooms = 1;
                    break;
                }
            }
        }
        if rooms == 0 {
            return Err(GenerationError::NoRooms);
        }
        debug!("painted {rooms} rooms");

        self.connect_corridors();
        self.phase = Phase::Rooms;
        Ok(())
    }

    /// Paint the leaf's inset rectangle with Room cells, clipped to the
    /// grid. Returns whether any cell was painted; `has_room` is only set in
    /// that case so spawn queries never land in a zero-cell room.
    fn paint_room(&mut self, id: PartitionId, cfg: &GenConfig) -> bool {
        let p = self.tree.node(id);
        debug_assert!(p.is_leaf());
        let x0 = (p.left + cfg.room_inset).max(0);
        let y0 = (p.top + cfg.room_inset).max(0);
        let x1 = (p.right - cfg.room_inset).min(self.width as i32 - 2);
        let y1 = (p.bottom - cfg.room_inset).min(self.height as i32 - 2);
        if x0 > x1 || y0 > y1 {
            return false;
        }

        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set_kind(x as usize, y as usize, CellKind::Room);
            }
        }
        self.tree.node_mut(id).has_room = true;
        true
    }

    /// Connect every room-bearing leaf up through its ancestor chain. The
    /// tree structure guarantees global connectivity: every pair of rooms
    /// meets at a shared ancestor's routing point.
    fn connect_corridors(&mut self) {
        let room_leaves: Vec<PartitionId> = self
            .tree
            .leaves()
            .filter(|&id| self.tree.node(id).has_room)
            .collect();
        for id in room_leaves {
            self.connect_partition(id);
        }
    }

    /// Carve corridors along this node's connection chain, then recurse to
    /// the parent until the root is reached. Ancestor chains shared by
    /// several rooms are re-walked; the carve is idempotent so this is
    /// redundant but harmless.
    fn connect_partition(&mut self, id: PartitionId) {
        let node = self.tree.node(id);

        // Room-bearing children first, then this node, then its parent.
        let mut chain: SmallVec<[PartitionId; 8]> = SmallVec::new();
        if let Some(children) = node.children {
            chain.extend(children.iter().copied().filter(|&c| self.tree.node(c).has_room));
        }
        chain.push(id);
        if let Some(parent) = node.parent {
            chain.push(parent);
        }

        for pair in chain.windows(2) {
            let from = self.tree.node(pair[0]).center;
            let to = self.tree.node(pair[1]).center;
            self.carve_corridor(from, to);
        }

        if let Some(parent) = self.tree.node(id).parent {
            self.connect_partition(parent);
        }
    }

    /// Walk a Manhattan path from `from` to `to`, x axis fully first, and
    /// turn every non-Room cell on the way into a corridor. The source cell
    /// itself is left untouched; the destination is painted.
    fn carve_corridor(&mut self, from: IVec2, to: IVec2) {
        let mut cur = from;
        while cur != to {
            if cur.x < to.x {
                cur.x += 1;
            } else if cur.x > to.x {
                cur.x -= 1;
            } else if cur.y < to.y {
                cur.y += 1;
            } else {
                cur.y -= 1;
            }

            let (x, y) = (cur.x as usize, cur.y as usize);
            if self.kind(x, y) != CellKind::Room {
                self.set_kind(x, y, CellKind::Corridor);
            }
        }
    }

    // ──────────────────────────────────────────────────────────────────
    //                      Phase 2 – wall derivation
    // ──────────────────────────────────────────────────────────────────

    /// Derive wall flags from kind adjacency: a non-Empty cell gets a wall
    /// towards every grid edge and every Empty neighbour. Pure function of
    /// the kind grid; re-running recomputes identical flags.
    pub fn generate_walls(&mut self) {
        assert!(
            self.phase >= Phase::Rooms,
            "generate_walls before generate_rooms"
        );

        for y in 0..self.height {
            for x in 0..self.width {
                let mut walls = DirSet::empty();
                if self.kind(x, y) != CellKind::Empty {
                    let here = IVec2::new(x as i32, y as i32);
                    for dir in Dir::ALL {
                        match self.kind_at(here + dir.offset()) {
                            None | Some(CellKind::Empty) => walls |= dir.flag(),
                            _ => {}
                        }
                    }
                }
                self.cells[y * self.width + x].walls = walls;
            }
        }
        if self.phase < Phase::Walls {
            self.phase = Phase::Walls;
        }
    }

    // ──────────────────────────────────────────────────────────────────
    //                      Phase 3 – door derivation
    // ──────────────────────────────────────────────────────────────────

    /// Derive door flags: a corridor cell walled on two opposite sides gets
    /// a door towards each neighbouring Room cell. Corridor-to-corridor
    /// junctions never receive doors; that is a known limitation of the
    /// rule, kept as documented behaviour.
    pub fn generate_doors(&mut self) {
        assert!(
            self.phase >= Phase::Walls,
            "generate_doors before generate_walls"
        );

        for cell in &mut self.cells {
            cell.doors = DirSet::empty();
        }

        // The border is skipped; walls there face the void, never a room.
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                if self.kind(x, y) != CellKind::Corridor {
                    continue;
                }
                let walls = self.cell(x, y).walls;
                let mut doors = DirSet::empty();

                // Walled west+east: the corridor runs north-south, so a
                // room ahead or behind gets a door.
                if walls.contains(DirSet::WEST | DirSet::EAST) {
                    if self.kind(x, y - 1) == CellKind::Room {
                        doors |= DirSet::NORTH;
                    }
                    if self.kind(x, y + 1) == CellKind::Room {
                        doors |= DirSet::SOUTH;
                    }
                }
                // Walled north+south: same check sideways.
                if walls.contains(DirSet::NORTH | DirSet::SOUTH) {
                    if self.kind(x - 1, y) == CellKind::Room {
                        doors |= DirSet::WEST;
                    }
                    if self.kind(x + 1, y) == CellKind::Room {
                        doors |= DirSet::EAST;
                    }
                }

                self.cells[y * self.width + x].doors = doors;
            }
        }
        self.phase = Phase::Doors;
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Test support
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
impl Dungeon {
    /// Hand-built grid for derivation and query tests: `paint` returns the
    /// kind for each coordinate, and the dungeon is advanced past the
    /// painting phase.
    pub(crate) fn from_kinds<F>(width: usize, height: usize, paint: F) -> Self
    where
        F: Fn(usize, usize) -> CellKind,
    {
        let mut dungeon = Self::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                dungeon.set_kind(x, y, paint(x, y));
            }
        }
        dungeon.phase = Phase::Rooms;
        dungeon
    }
}
