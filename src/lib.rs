//! Procedural dungeon crawler core.
//!
//! The crate is split the same way the runtime uses it:
//!
//! * [`world`] – cell grid, BSP partition arena and the generation phases
//!   (rooms → corridors → walls → doors).
//! * [`vis`]   – per-frame spatial queries: frustum culling, line-of-sight
//!   map reveal, parallel visibility sweep.
//! * [`sim`]   – the player agent (movement, rotation, view transform).
//!
//! Rendering front ends are deliberately thin consumers: they read the cell
//! grid and the visibility results, nothing more. `src/main.rs` ships a
//! minimal top-down software viewer as the reference consumer.

pub mod sim;
pub mod vis;
pub mod world;
