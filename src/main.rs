//! Top-down dungeon viewer.
//!
//! Reference consumer of the generator/query core: generates a dungeon,
//! drops the player into a random room and renders the grid with
//! fog-of-war driven by the visibility sweep.
//!
//! ```bash
//! cargo run --release -- --seed 1234
//! ```
//!
//! Keys: `W`/`S` step, `A`/`D` strafe, `←`/`→` turn 90°, Alt+`←`/`→`
//! free-look, `F` toggles fog, `Esc` quits.

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use glam::{Vec2, Vec3};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use delve_rs::sim::Player;
use delve_rs::vis::{Frustum, MAX_DRAW_DISTANCE, reveal, visible_cells};
use delve_rs::world::{CellKind, Dir, DirSet, Dungeon, GenConfig};

#[derive(Parser)]
#[command(about = "Top-down viewer for the dungeon generator")]
struct Args {
    /// Generation seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 64)]
    width: usize,

    #[arg(long, default_value_t = 64)]
    height: usize,

    /// Pixels per grid cell.
    #[arg(long, default_value_t = 12)]
    scale: usize,

    /// Start with fog-of-war disabled.
    #[arg(long)]
    no_fog: bool,
}

/* ─────────────────────────── palette ─────────────────────────── */

const COL_ROCK: u32 = 0x00_101010;
const COL_ROOM: u32 = 0x00_6a5a3a;
const COL_CORRIDOR: u32 = 0x00_4a4a55;
const COL_VISIBLE_TINT: u32 = 0x00_202010;
const COL_WALL: u32 = 0x00_c0c0c0;
const COL_DOOR: u32 = 0x00_c08030;
const COL_PLAYER: u32 = 0x00_40d040;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("seed: {seed}");

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut dungeon = Dungeon::generate(args.width, args.height, &GenConfig::default(), &mut rng)
        .context("dungeon generation failed")?;

    let spawn = dungeon.random_room(&mut rng)?.center;

    let (win_w, win_h) = (args.width * args.scale, args.height * args.scale);
    let mut window = Window::new("delve", win_w, win_h, WindowOptions::default())?;
    window.set_target_fps(60);

    let mut player = Player::new();
    player.set_perspective(60.0, win_w as f32 / win_h as f32, 0.1, 1024.0);
    player.set_position(Vec3::new(spawn.x as f32, 0.5, spawn.y as f32));
    player.set_rotation(Vec3::ZERO);

    let mut frustum = Frustum::default();
    let mut buffer = vec![0u32; win_w * win_h];
    let mut fog = !args.no_fog;

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let mut last_frame = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let t0 = Instant::now();
        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();

        /* movement --------------------------------------------------------- */
        if window.is_key_pressed(Key::W, KeyRepeat::Yes) {
            player.move_by(Vec3::NEG_Z, true, &dungeon);
        }
        if window.is_key_pressed(Key::S, KeyRepeat::Yes) {
            player.move_by(Vec3::Z, true, &dungeon);
        }
        if window.is_key_pressed(Key::A, KeyRepeat::Yes) {
            player.move_by(Vec3::NEG_X, true, &dungeon);
        }
        if window.is_key_pressed(Key::D, KeyRepeat::Yes) {
            player.move_by(Vec3::X, true, &dungeon);
        }

        let alt = window.is_key_down(Key::LeftAlt) || window.is_key_down(Key::RightAlt);
        if alt {
            /* Alt + ←/→  = free-look */
            let mut delta = Vec2::ZERO;
            if window.is_key_down(Key::Left) {
                delta.x -= 1.0;
            }
            if window.is_key_down(Key::Right) {
                delta.x += 1.0;
            }
            player.set_free_look(delta != Vec2::ZERO);
            player.set_free_look_delta(delta);
        } else {
            player.set_free_look(false);
            /* plain ←/→   = quarter turn */
            if window.is_key_pressed(Key::Left, KeyRepeat::No) {
                player.rotate(-90.0, true);
            }
            if window.is_key_pressed(Key::Right, KeyRepeat::No) {
                player.rotate(90.0, true);
            }
        }

        if window.is_key_pressed(Key::F, KeyRepeat::No) {
            fog = !fog;
        }

        player.tick(dt);

        /* visibility ------------------------------------------------------- */
        frustum.update(player.view_projection());
        let visible = visible_cells(&dungeon, &frustum, player.position(), MAX_DRAW_DISTANCE);
        reveal(&mut dungeon, player.position(), &visible);

        /* draw ------------------------------------------------------------- */
        draw_grid(&mut buffer, win_w, &dungeon, args.scale, fog);
        for vc in &visible {
            if !fog || dungeon.cell(vc.x, vc.y).uncovered {
                tint_cell(&mut buffer, win_w, vc.x, vc.y, args.scale);
            }
        }
        draw_player(&mut buffer, win_w, win_h, &player, args.scale);

        acc_time += t0.elapsed();
        acc_frames += 1;
        window.update_with_buffer(&buffer, win_w, win_h)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            println!("avg frame: {:.2} ms  ({} cells visible)", avg_ms, visible.len());
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/* ─────────────────────────── rasterising ─────────────────────────── */

fn draw_grid(buffer: &mut [u32], win_w: usize, dungeon: &Dungeon, scale: usize, fog: bool) {
    for y in 0..dungeon.height() {
        for x in 0..dungeon.width() {
            let cell = dungeon.cell(x, y);
            let colour = if fog && !cell.uncovered {
                COL_ROCK
            } else {
                match cell.kind {
                    CellKind::Empty => COL_ROCK,
                    CellKind::Room => COL_ROOM,
                    CellKind::Corridor => COL_CORRIDOR,
                }
            };
            fill_rect(buffer, win_w, x * scale, y * scale, scale, scale, colour);

            if fog && !cell.uncovered {
                continue;
            }
            draw_cell_edges(buffer, win_w, x, y, scale, cell.walls, COL_WALL);
            draw_cell_edges(buffer, win_w, x, y, scale, cell.doors, COL_DOOR);
        }
    }
}

/// Outline the cell edges named by `dirs`; doors repaint their edge in
/// their own colour.
fn draw_cell_edges(
    buffer: &mut [u32],
    win_w: usize,
    x: usize,
    y: usize,
    scale: usize,
    dirs: DirSet,
    colour: u32,
) {
    let (px, py) = (x * scale, y * scale);
    for dir in Dir::ALL {
        if !dirs.contains(dir.flag()) {
            continue;
        }
        match dir {
            Dir::North => fill_rect(buffer, win_w, px, py, scale, 1, colour),
            Dir::South => fill_rect(buffer, win_w, px, py + scale - 1, scale, 1, colour),
            Dir::West => fill_rect(buffer, win_w, px, py, 1, scale, colour),
            Dir::East => fill_rect(buffer, win_w, px + scale - 1, py, 1, scale, colour),
        }
    }
}

fn tint_cell(buffer: &mut [u32], win_w: usize, x: usize, y: usize, scale: usize) {
    let (px, py) = (x * scale, y * scale);
    for row in buffer[py * win_w..].chunks_mut(win_w).take(scale) {
        for pixel in &mut row[px..px + scale] {
            *pixel = pixel.saturating_add(COL_VISIBLE_TINT);
        }
    }
}

fn draw_player(buffer: &mut [u32], win_w: usize, win_h: usize, player: &Player, scale: usize) {
    let pos = player.position();
    let px = ((pos.x + 0.5) * scale as f32) as i32;
    let py = ((pos.z + 0.5) * scale as f32) as i32;

    let forward = player.forward();
    let tip_x = px + (forward.x * scale as f32 * 1.5) as i32;
    let tip_y = py + (forward.z * scale as f32 * 1.5) as i32;

    fill_rect(
        buffer,
        win_w,
        (px - 2).max(0) as usize,
        (py - 2).max(0) as usize,
        4,
        4,
        COL_PLAYER,
    );
    draw_line(buffer, win_w, win_h, px, py, tip_x, tip_y, COL_PLAYER);
}

fn fill_rect(buffer: &mut [u32], win_w: usize, x: usize, y: usize, w: usize, h: usize, colour: u32) {
    for row in buffer[y * win_w..].chunks_mut(win_w).take(h) {
        for pixel in row[x..].iter_mut().take(w) {
            *pixel = colour;
        }
    }
}

/// Integer Bresenham line-drawing algorithm.
fn draw_line(
    buf: &mut [u32],
    w: usize,
    h: usize,
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    colour: u32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if (0..w as i32).contains(&x0) && (0..h as i32).contains(&y0) {
            buf[y0 as usize * w + x0 as usize] = colour;
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x0 == x1 {
                break;
            }
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            if y0 == y1 {
                break;
            }
            err += dx;
            y0 += sy;
        }
    }
}
