/// Tuning knobs for the generation phases.
///
/// The defaults reproduce the classic layout: quad-splits bottom out around
/// 16-cell partitions, three quarters of the leaves host a room, and rooms
/// keep a two-cell margin to their partition edges.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Hard stop: a partition with either dimension at or below this is a leaf.
    pub min_dimension: i32,
    /// Secondary stop: below this dimension a vertical-axis node *may* stop.
    pub stop_dimension: i32,
    /// Chance (d100) for the secondary stop to fire, once past the root.
    pub stop_percent: u32,
    /// Chance (d100) for a leaf partition to host a room.
    pub room_percent: u32,
    /// Margin between a room's cells and its partition bounds.
    pub room_inset: i32,
    /// Split jitter is `dimension / divisor`; the root gets the wider wedge.
    pub root_jitter_divisor: i32,
    pub child_jitter_divisor: i32,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            min_dimension: 16,
            stop_dimension: 24,
            stop_percent: 25,
            room_percent: 75,
            room_inset: 2,
            root_jitter_divisor: 8,
            child_jitter_divisor: 4,
        }
    }
}

impl GenConfig {
    /// Jitter divisor for a node at `depth` (wider at the root, narrower below).
    #[inline]
    pub fn jitter_divisor(&self, depth: u8) -> i32 {
        if depth == 0 {
            self.root_jitter_divisor
        } else {
            self.child_jitter_divisor
        }
    }
}
