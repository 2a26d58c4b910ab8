mod cell;
mod config;
mod dungeon;
mod partition;

pub use cell::{Cell, CellKind, Dir, DirSet};

pub use config::GenConfig;

pub use dungeon::{Dungeon, GenerationError, MIN_GRID_DIMENSION};

pub use partition::{Partition, PartitionId, PartitionTree, SplitAxis};
