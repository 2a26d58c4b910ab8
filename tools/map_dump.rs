//! map_dump.rs - one-shot CLI that generates a dungeon and prints it as
//! ASCII, plus a few generation statistics. Handy for eyeballing layouts
//! and for comparing runs of the same seed without opening a window.
//!
//! USAGE:
//! ```bash
//! cargo run --bin map_dump -- --seed 1234 --width 64 --height 64
//! ```

use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use delve_rs::world::{CellKind, Dungeon, GenConfig};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Generation seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 64)]
    width: usize,

    #[arg(long, default_value_t = 64)]
    height: usize,

    /// Chance (d100) for a leaf partition to host a room.
    #[arg(long, default_value_t = 75)]
    room_percent: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let seed = opts.seed.unwrap_or_else(rand::random);
    let cfg = GenConfig {
        room_percent: opts.room_percent,
        ..GenConfig::default()
    };

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let dungeon = Dungeon::generate(opts.width, opts.height, &cfg, &mut rng)
        .context("dungeon generation failed")?;

    let mut rooms = 0usize;
    let mut corridors = 0usize;
    let mut doors = 0usize;

    for y in 0..dungeon.height() {
        let mut line = String::with_capacity(dungeon.width());
        for x in 0..dungeon.width() {
            let cell = dungeon.cell(x, y);
            line.push(match cell.kind {
                _ if cell.has_door() => {
                    doors += 1;
                    '+'
                }
                CellKind::Empty => ' ',
                CellKind::Room => {
                    rooms += 1;
                    '.'
                }
                CellKind::Corridor => {
                    corridors += 1;
                    '#'
                }
            });
        }
        println!("{line}");
    }

    let leaves = dungeon.tree().leaves().count();
    let room_leaves = dungeon
        .tree()
        .leaves()
        .filter(|&id| dungeon.tree().node(id).has_room)
        .count();

    println!();
    println!("seed: {seed}");
    println!("partitions: {} ({leaves} leaves, {room_leaves} with rooms)", dungeon.tree().len());
    println!("cells: {rooms} room, {corridors} corridor, {doors} with doors");
    Ok(())
}
