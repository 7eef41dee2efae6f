//! Character Controller
//!
//! Sole owner of the player's physical state. Everything here runs inside
//! the fixed step: camera-relative acceleration, friction, the jump family
//! (coyote time, buffered presses, triple jump, wall jump), gravity with
//! wall-slide reduction, tram velocity inheritance, and sub-stepped
//! integration against the collider registry. Other subsystems read this
//! state; none of them write it.
//!
//! Jump rules: a buffered press is consumed by exactly one jump. Grounded
//! (or coyote) presses start the chain at count 1; aerial presses spend the
//! remaining budget up to `max_jumps`; a wall jump restarts the chain at 1.
//! Only a landing transition resets the count to 0.

use macroquad::math::{vec3, Vec3};

use super::collision::{resolve_platform, resolve_sphere, ColliderSet, PlatformContact};
use super::event::{Events, FellOutEvent, JumpedEvent, LandedEvent, WallJumpedEvent};
use super::settings::PlayerTuning;
use crate::world::Tram;

/// Per-frame input snapshot. Produced by the input collaborator outside the
/// core and consumed read-only here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sprint: bool,
}

pub struct CharacterController {
    /// Feet position
    pub position: Vec3,
    pub velocity: Vec3,
    /// Heading around Y, radians, smoothed toward the movement direction
    pub facing: f32,
    pub grounded: bool,
    pub touching_wall: bool,
    /// Outward normal of the touched wall; valid while `touching_wall`
    pub wall_normal: Vec3,
    /// Sequential jumps since the last landing, ground jump included
    pub jump_count: u8,
    /// Velocity inherited from the platform currently ridden
    pub platform_velocity: Vec3,
    /// True while standing on the tram
    pub riding_platform: bool,
    /// Smoothed angular speed, for the animator's sway
    pub turn_rate: f32,

    coyote_timer: f32,
    buffer_timer: f32,
    jump_was_down: bool,
    spawn_point: Vec3,
}

impl CharacterController {
    pub fn new(spawn_point: Vec3) -> Self {
        Self {
            position: spawn_point,
            velocity: Vec3::ZERO,
            facing: 0.0,
            grounded: false,
            touching_wall: false,
            wall_normal: Vec3::ZERO,
            jump_count: 0,
            platform_velocity: Vec3::ZERO,
            riding_platform: false,
            turn_rate: 0.0,
            coyote_timer: 0.0,
            buffer_timer: 0.0,
            jump_was_down: false,
            spawn_point,
        }
    }

    /// Put the player back at spawn with all transient state cleared.
    pub fn respawn(&mut self) {
        self.position = self.spawn_point;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
        self.touching_wall = false;
        self.wall_normal = Vec3::ZERO;
        self.jump_count = 0;
        self.platform_velocity = Vec3::ZERO;
        self.riding_platform = false;
        self.turn_rate = 0.0;
        self.coyote_timer = 0.0;
        self.buffer_timer = 0.0;
    }

    pub fn spawn_point(&self) -> Vec3 {
        self.spawn_point
    }

    pub fn horizontal_velocity(&self) -> Vec3 {
        vec3(self.velocity.x, 0.0, self.velocity.z)
    }

    pub fn horizontal_speed(&self) -> f32 {
        self.horizontal_velocity().length()
    }

    /// Sliding down a wall: airborne, falling, pressed against it.
    pub fn wall_sliding(&self) -> bool {
        self.touching_wall && !self.grounded && self.velocity.y < 0.0
    }

    /// One fixed physics step.
    pub fn fixed_update(
        &mut self,
        input: &ControlFlags,
        camera_yaw: f32,
        colliders: &ColliderSet,
        tram: &Tram,
        tuning: &PlayerTuning,
        dt: f32,
        events: &mut Events,
    ) {
        let was_grounded = self.grounded;

        let wish = self.wish_direction(input, camera_yaw);
        self.update_facing(wish, tuning, dt);
        self.apply_friction(wish, tuning, dt);
        self.apply_acceleration(wish, input.sprint, tuning, dt);
        self.update_jumping(input, tuning, dt, events);
        self.apply_gravity(tuning, dt);
        self.integrate(colliders, tram, tuning, dt, was_grounded, events);
        self.check_kill_plane(tuning, events);
    }

    /// Camera-relative world-space movement direction, normalized.
    fn wish_direction(&self, input: &ControlFlags, camera_yaw: f32) -> Vec3 {
        let forward = vec3(camera_yaw.sin(), 0.0, camera_yaw.cos());
        let right = vec3(camera_yaw.cos(), 0.0, -camera_yaw.sin());

        let mut dir = Vec3::ZERO;
        if input.forward {
            dir += forward;
        }
        if input.backward {
            dir -= forward;
        }
        if input.right {
            dir += right;
        }
        if input.left {
            dir -= right;
        }
        dir.normalize_or_zero()
    }

    /// Turn smoothly toward the movement direction, tracking the angular
    /// speed for the animator.
    fn update_facing(&mut self, wish: Vec3, tuning: &PlayerTuning, dt: f32) {
        if wish.length_squared() < 1e-6 {
            self.turn_rate *= (1.0 - 8.0 * dt).max(0.0);
            return;
        }
        let target = wish.x.atan2(wish.z);
        let mut diff = (target - self.facing).rem_euclid(std::f32::consts::TAU);
        if diff > std::f32::consts::PI {
            diff -= std::f32::consts::TAU;
        }
        let applied = diff * (tuning.turn_rate * dt).min(1.0);
        self.facing = (self.facing + applied).rem_euclid(std::f32::consts::TAU);
        self.turn_rate = if dt > 0.0 { applied / dt } else { 0.0 };
    }

    /// Decay horizontal speed while there is no directional input; clamps
    /// at zero, never reverses.
    fn apply_friction(&mut self, wish: Vec3, tuning: &PlayerTuning, dt: f32) {
        if wish.length_squared() > 1e-6 {
            return;
        }
        let h = self.horizontal_velocity();
        let speed = h.length();
        if speed <= 0.0 {
            return;
        }
        let coeff = if self.grounded {
            tuning.ground_friction
        } else {
            tuning.air_friction
        };
        let new_speed = (speed - speed * coeff * dt).max(0.0);
        let scaled = h * (new_speed / speed);
        self.velocity.x = scaled.x;
        self.velocity.z = scaled.z;
    }

    /// Accelerate toward the capped wish velocity.
    fn apply_acceleration(&mut self, wish: Vec3, sprint: bool, tuning: &PlayerTuning, dt: f32) {
        if wish.length_squared() < 1e-6 {
            return;
        }
        let cap = if sprint {
            tuning.sprint_speed
        } else {
            tuning.walk_speed
        };
        let accel = if self.grounded {
            tuning.ground_accel
        } else {
            tuning.air_accel
        };

        let deficit = wish * cap - self.horizontal_velocity();
        let deficit_len = deficit.length();
        if deficit_len <= 0.0 {
            return;
        }
        let add = deficit_len.min(accel * dt);
        let step = deficit * (add / deficit_len);
        self.velocity.x += step.x;
        self.velocity.z += step.z;
    }

    /// Coyote and buffer bookkeeping, then at most one jump per press.
    fn update_jumping(
        &mut self,
        input: &ControlFlags,
        tuning: &PlayerTuning,
        dt: f32,
        events: &mut Events,
    ) {
        if self.grounded {
            self.coyote_timer = tuning.coyote_time;
        } else {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }

        let pressed = input.jump && !self.jump_was_down;
        self.jump_was_down = input.jump;
        if pressed {
            self.buffer_timer = tuning.jump_buffer;
        } else {
            self.buffer_timer = (self.buffer_timer - dt).max(0.0);
        }
        if self.buffer_timer <= 0.0 {
            return;
        }

        if self.grounded || self.coyote_timer > 0.0 {
            self.velocity.y = tuning.jump_force;
            self.grounded = false;
            self.coyote_timer = 0.0;
            self.buffer_timer = 0.0;
            self.jump_count = 1;
            events.jumps.send(JumpedEvent {
                position: self.position,
                aerial: false,
            });
        } else if self.touching_wall {
            let push = self.wall_normal * tuning.wall_jump_push;
            self.velocity.x = push.x;
            self.velocity.z = push.z;
            self.velocity.y = tuning.wall_jump_force;
            self.buffer_timer = 0.0;
            self.jump_count = 1;
            events.wall_jumps.send(WallJumpedEvent {
                position: self.position,
                normal: self.wall_normal,
            });
        } else if self.jump_count < tuning.max_jumps {
            self.velocity.y = tuning.jump_force;
            self.buffer_timer = 0.0;
            self.jump_count += 1;
            events.jumps.send(JumpedEvent {
                position: self.position,
                aerial: true,
            });
        }
        // Otherwise the press stays buffered for the next valid contact
    }

    fn apply_gravity(&mut self, tuning: &PlayerTuning, dt: f32) {
        if self.grounded {
            return;
        }
        let scale = if self.wall_sliding() {
            tuning.wall_slide_gravity
        } else {
            1.0
        };
        self.velocity.y -= tuning.gravity * scale * dt;
        self.velocity.y = self.velocity.y.max(-tuning.max_fall_speed);
    }

    /// Sub-stepped integration with collision resolution after every
    /// sub-step. Vertical velocity is zeroed exactly once per ground or
    /// ceiling contact; the landing transition resets the jump chain.
    fn integrate(
        &mut self,
        colliders: &ColliderSet,
        tram: &Tram,
        tuning: &PlayerTuning,
        dt: f32,
        was_grounded: bool,
        events: &mut Events,
    ) {
        // Ride the platform before integrating this step's velocity
        if self.riding_platform {
            self.position += self.platform_velocity * dt;
        }

        let substeps = tuning.substeps.max(1) as u32;
        let sub_dt = dt / substeps as f32;
        let mut landed_impact: Option<f32> = None;
        // Wall contact is sticky across the tick: once the into-wall
        // velocity is cancelled, later sub-steps separate cleanly, but the
        // player is still "at the wall" for sliding and wall jumps
        let mut touched_wall = false;

        for _ in 0..substeps {
            self.position += self.velocity * sub_dt;

            let resolved = resolve_sphere(
                self.position,
                tuning.radius,
                tuning.step_height,
                self.velocity.y,
                colliders,
            );
            self.position = resolved.position;
            let mut grounded = resolved.grounded;

            // Kill the velocity component pressing into the wall so the
            // remaining motion slides along it
            if resolved.touching_wall {
                touched_wall = true;
                self.wall_normal = resolved.wall_normal;
                let into = self.velocity.dot(resolved.wall_normal);
                if into < 0.0 {
                    self.velocity -= resolved.wall_normal * into;
                }
            }

            let platform = resolve_platform(
                &mut self.position,
                tuning.radius,
                tuning.step_height,
                self.velocity.y,
                &tram.aabb(),
            );
            match platform {
                PlatformContact::Top => {
                    grounded = true;
                    self.riding_platform = true;
                    self.platform_velocity = tram.velocity();
                }
                PlatformContact::Side(normal) => {
                    touched_wall = true;
                    self.wall_normal = normal;
                    let into = self.velocity.dot(normal);
                    if into < 0.0 {
                        self.velocity -= normal * into;
                    }
                }
                PlatformContact::None => {}
            }
            if platform != PlatformContact::Top {
                self.riding_platform = false;
                self.platform_velocity = Vec3::ZERO;
            }

            if resolved.hit_ceiling && self.velocity.y > 0.0 {
                self.velocity.y = 0.0;
            }
            if grounded && self.velocity.y <= 0.0 {
                if !was_grounded && landed_impact.is_none() {
                    landed_impact = Some(-self.velocity.y.min(0.0));
                }
                self.velocity.y = 0.0;
            }
            self.grounded = grounded;
        }
        self.touching_wall = touched_wall;

        if let Some(impact_speed) = landed_impact {
            self.jump_count = 0;
            events.landings.send(LandedEvent {
                position: self.position,
                impact_speed,
            });
        }
    }

    /// Falling out of the world is a game event, not a crash.
    fn check_kill_plane(&mut self, tuning: &PlayerTuning, events: &mut Events) {
        if self.position.y >= tuning.kill_height {
            return;
        }
        events.fell_out.send(FellOutEvent {
            position: self.position,
        });
        self.respawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::Aabb;
    use crate::game::settings::PlayerTuning;

    const DT: f32 = 1.0 / 60.0;

    fn flat_world() -> ColliderSet {
        ColliderSet::new(vec![Aabb::new(
            vec3(-100.0, -1.0, -100.0),
            vec3(100.0, 0.0, 100.0),
        )])
    }

    fn parked_tram() -> Tram {
        // Far away and stationary so it never interferes
        Tram::new(
            vec3(500.0, 0.75, 500.0),
            vec3(500.0, 0.75, 520.0),
            0.0,
            vec3(1.2, 0.6, 2.5),
        )
    }

    fn step(
        ctrl: &mut CharacterController,
        input: &ControlFlags,
        world: &ColliderSet,
        tram: &Tram,
        tuning: &PlayerTuning,
        events: &mut Events,
    ) {
        ctrl.fixed_update(input, 0.0, world, tram, tuning, DT, events);
    }

    fn settle(
        ctrl: &mut CharacterController,
        world: &ColliderSet,
        tram: &Tram,
        tuning: &PlayerTuning,
    ) {
        let mut events = Events::new();
        for _ in 0..120 {
            step(ctrl, &ControlFlags::default(), world, tram, tuning, &mut events);
        }
        assert!(ctrl.grounded, "player failed to settle");
    }

    #[test]
    fn test_friction_decays_without_reversing() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);
        ctrl.velocity.x = 5.0;

        let mut last_speed = ctrl.horizontal_speed();
        for _ in 0..300 {
            step(&mut ctrl, &ControlFlags::default(), &world, &tram, &tuning, &mut events);
            let speed = ctrl.horizontal_speed();
            assert!(speed <= last_speed + 1e-5);
            assert!(ctrl.velocity.x >= 0.0, "friction reversed the velocity");
            last_speed = speed;
        }
        assert!(last_speed < 1e-3);
    }

    #[test]
    fn test_grounded_jump_clears_ground_flag() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let input = ControlFlags {
            jump: true,
            ..Default::default()
        };
        step(&mut ctrl, &input, &world, &tram, &tuning, &mut events);

        assert!(!ctrl.grounded);
        assert!(ctrl.velocity.y > 0.0);
        assert_eq!(ctrl.jump_count, 1);
        assert_eq!(events.jumps.len(), 1);
    }

    #[test]
    fn test_aerial_jump_budget_is_enforced() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let held = ControlFlags {
            jump: true,
            ..Default::default()
        };
        let released = ControlFlags::default();

        // Jump, then re-press twice in the air: three total
        for expected in 1..=3u8 {
            step(&mut ctrl, &held, &world, &tram, &tuning, &mut events);
            assert_eq!(ctrl.jump_count, expected);
            step(&mut ctrl, &released, &world, &tram, &tuning, &mut events);
        }
        assert_eq!(events.jumps.len(), 3);

        // Budget spent: a fourth press does nothing
        step(&mut ctrl, &held, &world, &tram, &tuning, &mut events);
        assert_eq!(ctrl.jump_count, 3);
        assert_eq!(events.jumps.len(), 3);
    }

    #[test]
    fn test_held_jump_is_one_buffered_press() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let held = ControlFlags {
            jump: true,
            ..Default::default()
        };
        for _ in 0..20 {
            step(&mut ctrl, &held, &world, &tram, &tuning, &mut events);
        }
        // Holding the button never chains extra jumps
        assert_eq!(events.jumps.len(), 1);
        assert_eq!(ctrl.jump_count, 1);
    }

    #[test]
    fn test_landing_resets_jump_chain_and_vertical_velocity() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let input = ControlFlags {
            jump: true,
            ..Default::default()
        };
        step(&mut ctrl, &input, &world, &tram, &tuning, &mut events);
        assert_eq!(ctrl.jump_count, 1);

        let mut landed = false;
        for _ in 0..300 {
            step(&mut ctrl, &ControlFlags::default(), &world, &tram, &tuning, &mut events);
            if ctrl.grounded {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(ctrl.jump_count, 0);
        assert_eq!(ctrl.velocity.y, 0.0);
        assert_eq!(events.landings.len(), 1);
    }

    #[test]
    fn test_gravity_only_settles_onto_ground() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 2.0, 0.0));
        for _ in 0..240 {
            step(&mut ctrl, &ControlFlags::default(), &world, &tram, &tuning, &mut events);
        }
        assert!(ctrl.grounded);
        assert_eq!(ctrl.velocity.y, 0.0);
        assert!((ctrl.position.y - 0.0).abs() < 1e-4);
    }

    #[test]
    fn test_forward_input_approaches_walk_cap_and_faces_travel() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let input = ControlFlags {
            forward: true,
            ..Default::default()
        };
        for _ in 0..300 {
            step(&mut ctrl, &input, &world, &tram, &tuning, &mut events);
        }
        let speed = ctrl.horizontal_speed();
        assert!(speed > tuning.walk_speed * 0.9);
        assert!(speed <= tuning.walk_speed + 1e-3);
        // Camera yaw 0 means forward is +z, facing atan2(0, 1) = 0
        assert!(ctrl.facing.abs() < 1e-2 || (ctrl.facing - std::f32::consts::TAU).abs() < 1e-2);
    }

    #[test]
    fn test_sprint_raises_the_cap() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let input = ControlFlags {
            forward: true,
            sprint: true,
            ..Default::default()
        };
        for _ in 0..300 {
            step(&mut ctrl, &input, &world, &tram, &tuning, &mut events);
        }
        assert!(ctrl.horizontal_speed() > tuning.walk_speed);
        assert!(ctrl.horizontal_speed() <= tuning.sprint_speed + 1e-3);
    }

    #[test]
    fn test_low_wall_steps_up_instead_of_blocking() {
        let mut boxes = vec![Aabb::new(
            vec3(-100.0, -1.0, -100.0),
            vec3(100.0, 0.0, 100.0),
        )];
        // Curb across the path, below the step height
        boxes.push(Aabb::new(vec3(-5.0, 0.0, 2.0), vec3(5.0, 0.4, 8.0)));
        let world = ColliderSet::new(boxes);
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let input = ControlFlags {
            forward: true,
            ..Default::default()
        };
        // Long enough to walk onto the curb, short enough to stay on it
        for _ in 0..70 {
            step(&mut ctrl, &input, &world, &tram, &tuning, &mut events);
        }
        assert!((ctrl.position.y - 0.4).abs() < 1e-3, "did not step onto the curb");
        assert!(ctrl.position.z > 2.0, "was blocked by a steppable curb");
        assert!(ctrl.grounded);
    }

    #[test]
    fn test_tall_wall_blocks_and_reports_normal() {
        let mut boxes = vec![Aabb::new(
            vec3(-100.0, -1.0, -100.0),
            vec3(100.0, 0.0, 100.0),
        )];
        boxes.push(Aabb::new(vec3(-5.0, 0.0, 2.0), vec3(5.0, 4.0, 8.0)));
        let world = ColliderSet::new(boxes);
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let input = ControlFlags {
            forward: true,
            ..Default::default()
        };
        for _ in 0..180 {
            step(&mut ctrl, &input, &world, &tram, &tuning, &mut events);
        }
        assert!(ctrl.position.z < 2.0);
        assert!(ctrl.touching_wall);
        assert!(ctrl.wall_normal.z < -0.99);
    }

    #[test]
    fn test_wall_jump_restarts_chain_and_pushes_away() {
        let mut boxes = vec![Aabb::new(
            vec3(-100.0, -1.0, -100.0),
            vec3(100.0, 0.0, 100.0),
        )];
        boxes.push(Aabb::new(vec3(-5.0, 0.0, 2.0), vec3(5.0, 6.0, 8.0)));
        let world = ColliderSet::new(boxes);
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        // Build up running speed, then jump into the wall
        let push_in = ControlFlags {
            forward: true,
            ..Default::default()
        };
        for _ in 0..30 {
            step(&mut ctrl, &push_in, &world, &tram, &tuning, &mut events);
        }
        let jump_in = ControlFlags {
            jump: true,
            forward: true,
            ..Default::default()
        };
        step(&mut ctrl, &jump_in, &world, &tram, &tuning, &mut events);
        for _ in 0..30 {
            step(&mut ctrl, &push_in, &world, &tram, &tuning, &mut events);
            if ctrl.touching_wall && !ctrl.grounded {
                break;
            }
        }
        assert!(ctrl.touching_wall && !ctrl.grounded);
        // Spend the rest of the budget so the wall jump is unambiguous
        ctrl.jump_count = tuning.max_jumps;

        let wall_jump = ControlFlags {
            jump: true,
            ..Default::default()
        };
        step(&mut ctrl, &wall_jump, &world, &tram, &tuning, &mut events);

        assert_eq!(events.wall_jumps.len(), 1);
        assert_eq!(ctrl.jump_count, 1);
        assert!(ctrl.velocity.y > 0.0);
        assert!(ctrl.velocity.z < 0.0, "wall jump should push away from the wall");
    }

    #[test]
    fn test_coyote_window_allows_a_late_jump() {
        // Ledge: ground ends at z = 2
        let world = ColliderSet::new(vec![Aabb::new(
            vec3(-100.0, -1.0, -100.0),
            vec3(100.0, 0.0, 2.0),
        )]);
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        let run = ControlFlags {
            forward: true,
            sprint: true,
            ..Default::default()
        };
        let mut left_ground = false;
        for _ in 0..600 {
            step(&mut ctrl, &run, &world, &tram, &tuning, &mut events);
            if !ctrl.grounded {
                left_ground = true;
                break;
            }
        }
        assert!(left_ground, "never ran off the ledge");

        // One step past the edge, still inside the coyote window
        let jump = ControlFlags {
            forward: true,
            jump: true,
            ..Default::default()
        };
        step(&mut ctrl, &jump, &world, &tram, &tuning, &mut events);

        let grounded_style: Vec<_> = events.jumps.iter().collect();
        assert!(!grounded_style.is_empty());
        assert!(!grounded_style.last().unwrap().aerial);
        assert_eq!(ctrl.jump_count, 1);
    }

    #[test]
    fn test_buffered_press_fires_on_landing() {
        let world = flat_world();
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut ctrl = CharacterController::new(vec3(0.0, 0.5, 0.0));
        settle(&mut ctrl, &world, &tram, &tuning);

        // Drop from above with the whole budget spent and no grace window
        ctrl.position = vec3(0.0, 0.4, 0.0);
        ctrl.grounded = false;
        ctrl.jump_count = tuning.max_jumps;
        ctrl.velocity.y = -2.0;
        ctrl.coyote_timer = 0.0;

        // Press while falling; budget is gone, so nothing fires yet
        let press = ControlFlags {
            jump: true,
            ..Default::default()
        };
        step(&mut ctrl, &press, &world, &tram, &tuning, &mut events);
        events.jumps.clear();

        // Keep the button held; the buffered press executes on contact
        let mut jumped = false;
        for _ in 0..8 {
            step(&mut ctrl, &press, &world, &tram, &tuning, &mut events);
            if !events.jumps.is_empty() {
                jumped = true;
                break;
            }
        }
        assert!(jumped, "buffered jump never fired after landing");
        assert_eq!(ctrl.jump_count, 1);
    }

    #[test]
    fn test_fall_out_respawns_once_with_zero_velocity() {
        // No ground at all
        let world = ColliderSet::new(Vec::new());
        let tram = parked_tram();
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let spawn = vec3(0.0, 1.0, 0.0);
        let mut ctrl = CharacterController::new(spawn);
        for _ in 0..600 {
            step(&mut ctrl, &ControlFlags::default(), &world, &tram, &tuning, &mut events);
            if !events.fell_out.is_empty() {
                break;
            }
        }

        // Exactly one event for the crossing, and the player is already
        // back at spawn with velocity cleared
        assert_eq!(events.fell_out.len(), 1);
        let first = events.fell_out.iter().next().unwrap();
        assert!(first.position.y < tuning.kill_height);
        assert_eq!(ctrl.position, spawn);
        assert_eq!(ctrl.velocity, Vec3::ZERO);

        // The next step falls again from spawn; no duplicate event fires
        step(&mut ctrl, &ControlFlags::default(), &world, &tram, &tuning, &mut events);
        assert_eq!(events.fell_out.len(), 1);
    }

    #[test]
    fn test_riding_the_tram_carries_the_player() {
        let world = ColliderSet::new(Vec::new());
        let tuning = PlayerTuning::default();
        let mut events = Events::new();

        let mut tram = Tram::new(
            vec3(0.0, 0.75, -10.0),
            vec3(0.0, 0.75, 10.0),
            4.0,
            vec3(1.2, 0.6, 2.5),
        );

        // Start just above the tram roof
        let mut ctrl = CharacterController::new(vec3(0.0, tram.aabb().top() + 0.3, -10.0));
        let mut time = 0.0;
        for _ in 0..120 {
            time += DT;
            tram.advance(time, DT);
            step(&mut ctrl, &ControlFlags::default(), &world, &tram, &tuning, &mut events);
        }
        assert!(ctrl.riding_platform);
        assert!(ctrl.grounded);
        // Carried along +z with the tram
        assert!(ctrl.position.z > -9.0);
        assert!((ctrl.position.z - tram.position().z).abs() < 3.0);
    }
}
