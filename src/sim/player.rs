//! The player agent.
//!
//! Continuous position/heading living on top of the discrete cell grid:
//! movement queries round to a grid cell and ask the dungeon whether it is
//! walkable. Moves and turns either apply instantly or animate towards a
//! recorded target a bit per tick.

use glam::{EulerRot, IVec2, Mat4, Quat, Vec2, Vec3};

use crate::world::Dungeon;

/// Cells per second while a move animates.
pub const MOVE_SPEED: f32 = 2.0;
/// Degrees per second while a turn animates.
pub const TURN_SPEED: f32 = 65.0;

const FREE_LOOK_SPEED: f32 = 65.0;
const FREE_LOOK_REBOUND: f32 = 0.25;
/// Free-look never strays more than this many degrees off the heading.
const FREE_LOOK_LIMIT: f32 = 7.5;

/// First-person agent state plus its derived view/projection transforms.
///
/// Known limitation, kept as documented behaviour: while a move or turn
/// animation is in flight, new requests of the same kind are dropped, not
/// queued.
#[derive(Debug, Clone)]
pub struct Player {
    position: Vec3,
    /// Degrees; `x` = pitch, `y` = heading (0 faces north, clockwise).
    rotation: Vec3,

    // pending animation state
    target_position: Vec3,
    target_rotation: f32,
    rotation_dir: f32,
    anim_rotation: f32,

    free_look: bool,
    free_look_delta: Vec2,
    free_look_rotation: Vec2,

    projection: Mat4,
    view: Mat4,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        let mut player = Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            target_position: Vec3::ZERO,
            target_rotation: 0.0,
            rotation_dir: 0.0,
            anim_rotation: 0.0,
            free_look: false,
            free_look_delta: Vec2::ZERO,
            free_look_rotation: Vec2::ZERO,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        };
        player.update_view_matrix();
        player
    }

    // ─────────────────────────── transforms ───────────────────────────

    pub fn set_perspective(&mut self, fov_degrees: f32, aspect: f32, znear: f32, zfar: f32) {
        self.projection = Mat4::perspective_rh(fov_degrees.to_radians(), aspect, znear, zfar);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.target_position = position;
        self.update_view_matrix();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.target_rotation = rotation.y;
        self.rotation_dir = 0.0;
        self.free_look_delta = Vec2::ZERO;
        self.free_look_rotation = Vec2::ZERO;
        self.update_view_matrix();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Combined transform fed to the frustum each frame.
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// The grid cell the agent currently occupies.
    #[inline]
    pub fn grid_cell(&self) -> IVec2 {
        IVec2::new(self.position.x.round() as i32, self.position.z.round() as i32)
    }

    /// Unit vector of the current heading on the grid plane.
    pub fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(-self.rotation.y.to_radians()) * Vec3::NEG_Z
    }

    fn update_view_matrix(&mut self) {
        let yaw = (self.rotation.y + self.free_look_rotation.y).to_radians();
        let pitch = (self.rotation.x + self.free_look_rotation.x).to_radians();
        let dir = Quat::from_euler(EulerRot::YXZ, -yaw, -pitch, 0.0) * Vec3::NEG_Z;
        self.view = Mat4::look_to_rh(self.position, dir, Vec3::Y);
    }

    // ─────────────────────────── movement ───────────────────────────

    /// Rotate `direction` by the heading and round to the grid cell the
    /// step would land on. `None` if that cell is off the grid or not
    /// walkable.
    pub fn can_move(&self, direction: Vec3, dungeon: &Dungeon) -> Option<IVec2> {
        let movement = Quat::from_rotation_y(-self.rotation.y.to_radians()) * direction;
        let target = IVec2::new(
            (self.position.x + movement.x).round() as i32,
            (self.position.z + movement.z).round() as i32,
        );
        match dungeon.kind_at(target) {
            Some(kind) if kind.walkable() => Some(target),
            _ => None,
        }
    }

    /// Try to move one step along `direction` (agent-local, e.g. `NEG_Z`
    /// for forward). The direction is rotated by the heading, the target
    /// cell is found by rounding, and the move is rejected if that cell is
    /// not walkable.
    ///
    /// With `animate` the move is recorded and consumed by [`tick`]; a
    /// request made while another is still animating is ignored.
    ///
    /// [`tick`]: Player::tick
    pub fn move_by(&mut self, direction: Vec3, animate: bool, dungeon: &Dungeon) -> bool {
        if self.can_move(direction, dungeon).is_none() {
            return false;
        }
        let movement = Quat::from_rotation_y(-self.rotation.y.to_radians()) * direction;

        if !animate {
            self.position.x += movement.x;
            self.position.z += movement.z;
            self.target_position = self.position;
            self.update_view_matrix();
        } else if self.position.distance(self.target_position) == 0.0 {
            self.target_position = self.position + Vec3::new(movement.x, 0.0, movement.z);
        }
        true
    }

    /// Turn by `angle_degrees` (positive = clockwise). Animated turns are
    /// dropped while one is already in flight.
    pub fn rotate(&mut self, angle_degrees: f32, animate: bool) {
        if !animate {
            self.rotation.y = (self.rotation.y + angle_degrees).rem_euclid(360.0);
            self.target_rotation = self.rotation.y;
            self.update_view_matrix();
        } else if self.rotation_dir == 0.0 {
            self.rotation_dir = angle_degrees.signum();
            self.target_rotation = self.rotation.y + angle_degrees;
            self.anim_rotation = angle_degrees.abs();
        }
    }

    pub fn set_free_look(&mut self, enabled: bool) {
        self.free_look = enabled;
    }

    pub fn set_free_look_delta(&mut self, delta: Vec2) {
        self.free_look_delta = delta;
    }

    // ─────────────────────────── per-frame tick ───────────────────────────

    /// Advance all pending animations by `dt` seconds. Returns whether the
    /// view transform changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut changed = self.update_free_look(dt);
        changed |= self.update_movement(dt);
        changed |= self.update_rotation(dt);
        if changed {
            self.update_view_matrix();
        }
        changed
    }

    /// Free-look drifts with the input delta while held and rebounds to
    /// center when released.
    fn update_free_look(&mut self, dt: f32) -> bool {
        if self.free_look {
            self.free_look_rotation.y += self.free_look_delta.x * dt * FREE_LOOK_SPEED;
            self.free_look_rotation.x += self.free_look_delta.y * dt * FREE_LOOK_SPEED;
            self.free_look_rotation = self
                .free_look_rotation
                .clamp(Vec2::splat(-FREE_LOOK_LIMIT), Vec2::splat(FREE_LOOK_LIMIT));
            return true;
        }

        if self.free_look_rotation == Vec2::ZERO {
            return false;
        }
        let rebound = dt * FREE_LOOK_SPEED * FREE_LOOK_REBOUND;
        for axis in [0, 1] {
            let v = self.free_look_rotation[axis];
            self.free_look_rotation[axis] = if v.abs() <= rebound {
                0.0
            } else {
                v - rebound * v.signum()
            };
        }
        true
    }

    fn update_movement(&mut self, dt: f32) -> bool {
        let distance = self.position.distance(self.target_position);
        if distance == 0.0 {
            return false;
        }
        let step = MOVE_SPEED * dt;
        if distance <= step {
            self.position = self.target_position;
        } else {
            self.position += (self.target_position - self.position) / distance * step;
        }
        true
    }

    fn update_rotation(&mut self, dt: f32) -> bool {
        if self.rotation_dir == 0.0 {
            return false;
        }
        let factor = self.rotation_dir * TURN_SPEED * dt;
        self.rotation.y += factor;
        self.anim_rotation -= factor.abs();
        if self.anim_rotation <= 0.0 {
            self.rotation.y = self.target_rotation.rem_euclid(360.0);
            self.target_rotation = self.rotation.y;
            self.rotation_dir = 0.0;
        }
        true
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CellKind;

    fn open_floor() -> Dungeon {
        Dungeon::from_kinds(16, 16, |x, y| {
            if x == 0 || y == 0 {
                CellKind::Empty
            } else {
                CellKind::Room
            }
        })
    }

    fn player_at(x: f32, z: f32) -> Player {
        let mut p = Player::new();
        p.set_position(Vec3::new(x, 0.5, z));
        p
    }

    #[test]
    fn move_into_rock_is_blocked() {
        let d = open_floor();
        let mut p = player_at(1.0, 1.0);
        // Facing north: the y=0 row is rock.
        assert!(!p.move_by(Vec3::NEG_Z, false, &d));
        assert_eq!(p.grid_cell(), IVec2::new(1, 1));
    }

    #[test]
    fn can_move_reports_the_target_cell() {
        let d = open_floor();
        let p = player_at(4.0, 4.0);
        assert_eq!(p.can_move(Vec3::NEG_Z, &d), Some(IVec2::new(4, 3)));
        let blocked = player_at(1.0, 1.0);
        assert_eq!(blocked.can_move(Vec3::NEG_Z, &d), None);
    }

    #[test]
    fn instant_move_lands_on_next_cell() {
        let d = open_floor();
        let mut p = player_at(4.0, 4.0);
        assert!(p.move_by(Vec3::NEG_Z, false, &d));
        assert_eq!(p.grid_cell(), IVec2::new(4, 3));
    }

    #[test]
    fn heading_rotates_the_move_vector() {
        let d = open_floor();
        let mut p = player_at(4.0, 4.0);
        p.set_rotation(Vec3::new(0.0, 90.0, 0.0));
        // Forward at heading 90 is east.
        assert!(p.move_by(Vec3::NEG_Z, false, &d));
        assert_eq!(p.grid_cell(), IVec2::new(5, 4));
    }

    #[test]
    fn off_grid_move_is_blocked() {
        let d = open_floor();
        let mut p = player_at(15.0, 8.0);
        p.set_rotation(Vec3::new(0.0, 90.0, 0.0));
        assert!(!p.move_by(Vec3::NEG_Z, false, &d));
    }

    #[test]
    fn animated_move_converges_and_drops_new_requests() {
        let d = open_floor();
        let mut p = player_at(4.0, 4.0);
        assert!(p.move_by(Vec3::NEG_Z, true, &d));
        let target = p.target_position;
        assert_eq!(target, Vec3::new(4.0, 0.5, 3.0));

        // Mid-flight request is ignored, not queued.
        assert!(p.tick(0.1));
        assert!(p.move_by(Vec3::NEG_Z, true, &d));
        assert_eq!(p.target_position, target);

        // Enough ticks to arrive, then the animation is spent.
        for _ in 0..20 {
            p.tick(0.1);
        }
        assert_eq!(p.position, target);
        assert!(!p.tick(0.1));
    }

    #[test]
    fn animated_turn_converges_on_target() {
        let mut p = player_at(4.0, 4.0);
        p.rotate(90.0, true);
        // A second request mid-turn is dropped.
        p.rotate(-90.0, true);
        for _ in 0..40 {
            p.tick(0.1);
        }
        assert!((p.rotation().y - 90.0).abs() < 1e-4);
    }

    #[test]
    fn tick_reports_view_changes() {
        let mut p = player_at(4.0, 4.0);
        assert!(!p.tick(0.1));
        p.rotate(90.0, true);
        assert!(p.tick(0.1));
    }
}
