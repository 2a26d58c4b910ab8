//! BSP partition arena.
//!
//! The map rectangle is quad-split recursively; every node lives in a flat
//! arena and refers to its parent and children by index. The tree is built
//! in one pass and its bounds never change afterwards – regeneration throws
//! the whole arena away and builds a new one.

use glam::IVec2;
use rand::Rng;

use super::config::GenConfig;

pub type PartitionId = u16;

/// Axis tag assigned to every node when it is created.
///
/// The tag does not pick the split direction (splits are always quads); it
/// gates the probabilistic stop rule in [`PartitionTree::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    Horizontal,
    Vertical,
}

/// One node of the partition tree.
#[derive(Debug, Clone)]
pub struct Partition {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    /// Rounded midpoint of the bounds, used as a corridor routing point.
    pub center: IVec2,
    pub axis: SplitAxis,
    pub depth: u8,
    /// Non-owning back-reference for the corridor chain walk.
    pub parent: Option<PartitionId>,
    /// Exactly zero or four children; the four tile this node's bounds.
    pub children: Option<[PartitionId; 4]>,
    /// Only leaves may host a room.
    pub has_room: bool,
}

impl Partition {
    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[inline(always)]
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                          Arena / recursive build
// ──────────────────────────────────────────────────────────────────────────

/// Flat arena of partitions; index 0 is the root of a built tree.
#[derive(Debug, Default)]
pub struct PartitionTree {
    nodes: Vec<Partition>,
}

impl PartitionTree {
    /// Recursively quad-split the map rectangle `(0,0)..(width,height)`.
    ///
    /// The shape of the tree is a pure function of the random sequence
    /// consumed from `rng`: the stop roll, the two jitter rolls per axis and
    /// the children's axis tags are drawn in a fixed order (children in NW,
    /// NE, SW, SE order, each subtree completed before the next starts).
    pub fn build<R: Rng>(width: i32, height: i32, cfg: &GenConfig, rng: &mut R) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build_node(None, 0, 0, width, height, SplitAxis::Horizontal, 0, cfg, rng);
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn build_node<R: Rng>(
        &mut self,
        parent: Option<PartitionId>,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        axis: SplitAxis,
        depth: u8,
        cfg: &GenConfig,
        rng: &mut R,
    ) -> PartitionId {
        assert!(
            self.nodes.len() < PartitionId::MAX as usize,
            "partition arena overflow at bounds ({left},{top})-({right},{bottom})"
        );
        assert!(
            left < right && top < bottom,
            "degenerate partition bounds ({left},{top})-({right},{bottom})"
        );

        let id = self.nodes.len() as PartitionId;
        let center = IVec2::new(
            ((left + right) as f32 * 0.5).round() as i32,
            ((top + bottom) as f32 * 0.5).round() as i32,
        );
        self.nodes.push(Partition {
            left,
            top,
            right,
            bottom,
            center,
            axis,
            depth,
            parent,
            children: None,
            has_room: false,
        });

        let (w, h) = (right - left, bottom - top);

        // Hard floor: too small to split further.
        if w <= cfg.min_dimension || h <= cfg.min_dimension {
            return id;
        }

        // Probabilistic stop, gated on the axis tag and skipped at the root
        // so the tree is never a single node by chance.
        if axis == SplitAxis::Vertical
            && (w < cfg.stop_dimension || h < cfg.stop_dimension)
            && depth > 0
            && rng.gen_range(0..100u32) < cfg.stop_percent
        {
            return id;
        }

        // Split point: midpoint plus bounded random jitter on each axis.
        let range_x = (w / cfg.jitter_divisor(depth)).max(1);
        let range_y = (h / cfg.jitter_divisor(depth)).max(1);
        let split_x = left + w / 2 + rng.gen_range(0..range_x) - rng.gen_range(0..range_x);
        let split_y = top + h / 2 + rng.gen_range(0..range_y) - rng.gen_range(0..range_y);

        let quads = [
            (left, top, split_x, split_y),
            (split_x, top, right, split_y),
            (left, split_y, split_x, bottom),
            (split_x, split_y, right, bottom),
        ];

        let mut children = [0 as PartitionId; 4];
        for (slot, &(l, t, r, b)) in children.iter_mut().zip(quads.iter()) {
            let child_axis = if rng.gen_range(0..2) == 0 {
                SplitAxis::Horizontal
            } else {
                SplitAxis::Vertical
            };
            *slot = self.build_node(Some(id), l, t, r, b, child_axis, depth + 1, cfg, rng);
        }
        self.nodes[id as usize].children = Some(children);

        id
    }

    // ─────────────────────────── accessors ───────────────────────────

    #[inline(always)]
    pub fn root(&self) -> PartitionId {
        assert!(!self.nodes.is_empty());
        0
    }

    #[inline(always)]
    pub fn node(&self, id: PartitionId) -> &Partition {
        &self.nodes[id as usize]
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, id: PartitionId) -> &mut Partition {
        &mut self.nodes[id as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf ids in arena (depth-first creation) order.
    pub fn leaves(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i as PartitionId)
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng(seed: u64) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn small_bounds_stay_single_leaf() {
        let tree = PartitionTree::build(10, 10, &GenConfig::default(), &mut rng(7));
        assert_eq!(tree.len(), 1);
        let root = tree.node(tree.root());
        assert!(root.is_leaf());
        assert_eq!(root.center, IVec2::new(5, 5));
    }

    #[test]
    fn children_tile_parent_exactly() {
        let tree = PartitionTree::build(64, 64, &GenConfig::default(), &mut rng(42));
        assert!(tree.len() > 1, "64x64 must split at least once");

        for id in 0..tree.len() as PartitionId {
            let node = tree.node(id);
            let Some(children) = node.children else {
                continue;
            };
            let child_area: i64 = children.iter().map(|&c| tree.node(c).area()).sum();
            assert_eq!(child_area, node.area(), "partition {id} has gaps or overlap");
            for &c in &children {
                let child = tree.node(c);
                assert!(child.left >= node.left && child.right <= node.right);
                assert!(child.top >= node.top && child.bottom <= node.bottom);
                assert_eq!(child.parent, Some(id));
                assert_eq!(child.depth, node.depth + 1);
            }
        }
    }

    #[test]
    fn same_seed_same_tree() {
        let a = PartitionTree::build(64, 64, &GenConfig::default(), &mut rng(1234));
        let b = PartitionTree::build(64, 64, &GenConfig::default(), &mut rng(1234));
        assert_eq!(a.len(), b.len());
        for id in 0..a.len() as PartitionId {
            let (na, nb) = (a.node(id), b.node(id));
            assert_eq!(
                (na.left, na.top, na.right, na.bottom, na.center),
                (nb.left, nb.top, nb.right, nb.bottom, nb.center)
            );
        }
    }

    #[test]
    fn leaves_cover_root_area() {
        let tree = PartitionTree::build(96, 64, &GenConfig::default(), &mut rng(5));
        let leaf_area: i64 = tree.leaves().map(|id| tree.node(id).area()).sum();
        assert_eq!(leaf_area, tree.node(tree.root()).area());
    }
}
