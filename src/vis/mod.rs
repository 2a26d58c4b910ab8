mod cull;
mod frustum;
mod los;

pub use cull::{CELL_HALF_EXTENTS, MAX_DRAW_DISTANCE, VisibleCell, reveal, visible_cells, world_pos};

pub use frustum::{BoxTest, Frustum};

pub use los::is_visible;
