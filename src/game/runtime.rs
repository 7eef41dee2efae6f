//! Game Runtime
//!
//! `Game` is the simulation context: it owns the world, the player, the
//! camera, the animator, the particle pool and the clock, and it is owned
//! in turn by whoever runs the frame loop. There is no global state;
//! dropping the context tears everything down, and because every update
//! happens synchronously inside `frame`, there is never a half-applied
//! step to clean up.
//!
//! Per frame: clamp and accumulate the delta, run the controller and world
//! for every whole fixed step, then update camera, animation and particles
//! once at render rate. The score and lives queues are the observer
//! surface; the surrounding application drains them after each frame.

use macroquad::color::Color;
use macroquad::math::{Vec2, Vec3};

use super::animation::Animator;
use super::camera::FollowCamera;
use super::clock::{FrameClock, FIXED_STEP};
use super::collision::{Aabb, ColliderSet};
use super::controller::{CharacterController, ControlFlags};
use super::event::{Events, LivesEvent, ScoreEvent};
use super::particles::ParticlePool;
use super::settings::GameSettings;
use crate::world::{self, Tram};

const JUMP_PUFF: Color = Color::new(0.92, 0.92, 0.95, 1.0);
const LANDING_DUST: Color = Color::new(0.78, 0.74, 0.66, 1.0);
const WALL_KICK: Color = Color::new(0.6, 0.6, 0.65, 1.0);
const PICKUP_SPARKLE: Color = Color::new(1.0, 0.84, 0.25, 1.0);

/// A fish somewhere in the city. Picked up once, revived on reset; the
/// set itself never shrinks, so the score denominator is stable.
#[derive(Debug, Clone, Copy)]
pub struct Collectible {
    pub position: Vec3,
    /// Resting height the renderer bobs around
    pub base_height: f32,
    pub active: bool,
}

pub struct Game {
    pub settings: GameSettings,
    pub player: CharacterController,
    pub camera: FollowCamera,
    pub animator: Animator,
    pub particles: ParticlePool,
    pub events: Events,
    colliders: ColliderSet,
    tram: Tram,
    collectibles: Vec<Collectible>,
    buildings: Vec<Aabb>,
    clock: FrameClock,
    controls: ControlFlags,
    score: u32,
    lives: u32,
    running: bool,
}

impl Game {
    /// Build a fresh city and place the player at its spawn point.
    pub fn new(settings: GameSettings) -> Result<Self, String> {
        settings.validate()?;
        let plan = world::generate(&settings.world);

        let collectibles = plan
            .collectible_spots
            .iter()
            .map(|&position| Collectible {
                position,
                base_height: position.y,
                active: true,
            })
            .collect::<Vec<_>>();

        let player = CharacterController::new(plan.spawn_point);
        let camera = FollowCamera::new(plan.spawn_point, &settings.camera);
        let mut colliders = ColliderSet::new(plan.colliders);
        colliders.set_moving(&[plan.tram.aabb()]);

        let mut events = Events::new();
        // The collectible total is known from here on
        events.score.send(ScoreEvent {
            score: 0,
            total: collectibles.len() as u32,
        });

        Ok(Self {
            lives: settings.lives,
            settings,
            player,
            camera,
            animator: Animator::new(),
            particles: ParticlePool::new(),
            events,
            colliders,
            tram: plan.tram,
            collectibles,
            buildings: plan.buildings,
            clock: FrameClock::new(),
            controls: ControlFlags::default(),
            score: 0,
            running: false,
        })
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    /// Start or pause the fixed-step simulation. Resuming clears any
    /// backlogged time and the held-input snapshot, so nothing "replays".
    pub fn set_running(&mut self, running: bool) {
        if running && !self.running {
            self.clock.discard_pending();
            self.controls = ControlFlags::default();
        }
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Replace the per-frame input snapshot.
    pub fn update_controls(&mut self, controls: ControlFlags) {
        self.controls = controls;
    }

    /// Feed pointer movement into the camera. Ignored while paused.
    pub fn apply_pointer_delta(&mut self, delta: Vec2) {
        if self.running {
            self.camera.apply_pointer_delta(delta, &self.settings.camera);
        }
    }

    /// Back to the initial state: full score and lives, every collectible
    /// revived, player at spawn, tram at the route start.
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.settings.lives;
        for c in &mut self.collectibles {
            c.active = true;
        }
        self.player.respawn();
        self.tram.reset();
        self.colliders.set_moving(&[self.tram.aabb()]);
        self.camera.snap_to(self.player.position, &self.settings.camera);
        self.animator.reset();
        self.particles.clear();
        self.clock = FrameClock::new();
        self.events.clear_all();
        self.events.score.send(ScoreEvent {
            score: 0,
            total: self.collectibles.len() as u32,
        });
    }

    // =========================================================================
    // Frame pipeline
    // =========================================================================

    /// Run one rendered frame's worth of simulation.
    pub fn frame(&mut self, raw_delta: f32) {
        if !self.running {
            return;
        }
        self.events.clear_all();

        let dt = self.clock.begin_frame(raw_delta);
        let camera_yaw = self.camera.yaw;

        while self.clock.step() {
            self.tram.advance(self.clock.elapsed(), FIXED_STEP);
            self.colliders.set_moving(&[self.tram.aabb()]);
            self.player.fixed_update(
                &self.controls,
                camera_yaw,
                &self.colliders,
                &self.tram,
                &self.settings.player,
                FIXED_STEP,
                &mut self.events,
            );
            self.check_pickups();
        }

        self.account_events();

        self.camera.update(
            self.player.position,
            self.player.velocity,
            &self.colliders,
            &self.settings.camera,
            dt,
        );
        self.animator
            .update(&self.player, self.controls.sprint, dt, &mut self.events);

        for request in self.events.emit_requests.drain() {
            self.particles
                .emit(request.position, request.count, request.color);
        }
        self.particles.tick(dt);
    }

    /// Distance-based pickup; the active flag makes it idempotent.
    fn check_pickups(&mut self) {
        let player_pos = self.player.position;
        let radius = self.settings.player.pickup_radius;
        for c in self.collectibles.iter_mut() {
            if !c.active {
                continue;
            }
            if (c.position - player_pos).length() <= radius {
                c.active = false;
                self.events.pickups.send(super::event::PickupEvent {
                    position: c.position,
                });
            }
        }
    }

    /// Turn this frame's gameplay events into score, lives and particles.
    fn account_events(&mut self) {
        let total = self.collectibles.len() as u32;
        let picked: Vec<_> = self.events.pickups.drain().collect();
        for pickup in picked {
            self.score += 1;
            self.events.score.send(ScoreEvent {
                score: self.score,
                total,
            });
            self.particles.emit(pickup.position, 10, PICKUP_SPARKLE);
        }

        let falls = self.events.fell_out.len();
        self.events.fell_out.clear();
        for _ in 0..falls {
            self.lives = self.lives.saturating_sub(1);
            self.events.lives.send(LivesEvent {
                remaining: self.lives,
            });
        }
        if falls > 0 {
            // The player teleported to spawn; sweeping the camera across
            // the city would read as a glitch
            self.camera
                .snap_to(self.player.position, &self.settings.camera);
        }

        let landings: Vec<_> = self.events.landings.drain().collect();
        for landing in landings {
            let count = (landing.impact_speed * 1.2).clamp(3.0, 12.0) as usize;
            self.particles.emit(landing.position, count, LANDING_DUST);
        }
        let jumps: Vec<_> = self.events.jumps.drain().collect();
        for jump in jumps {
            // Aerial jumps puff harder; there is no ground to kick off
            let count = if jump.aerial { 8 } else { 5 };
            self.particles.emit(jump.position, count, JUMP_PUFF);
        }
        let wall_jumps: Vec<_> = self.events.wall_jumps.drain().collect();
        for wall_jump in wall_jumps {
            let origin = wall_jump.position - wall_jump.normal * 0.2 + Vec3::Y * 0.3;
            self.particles.emit(origin, 6, WALL_KICK);
        }
    }

    // =========================================================================
    // Read-only views for the renderer and HUD
    // =========================================================================

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn total_collectibles(&self) -> u32 {
        self.collectibles.len() as u32
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    pub fn buildings(&self) -> &[Aabb] {
        &self.buildings
    }

    pub fn static_colliders(&self) -> &[Aabb] {
        self.colliders.statics()
    }

    pub fn tram_box(&self) -> Aabb {
        self.tram.aabb()
    }

    /// Total fixed-step time simulated so far.
    pub fn sim_time(&self) -> f32 {
        self.clock.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::math::vec3;

    fn running_game() -> Game {
        let mut game = Game::new(GameSettings::default()).unwrap();
        game.set_running(true);
        game
    }

    #[test]
    fn test_new_announces_collectible_total() {
        let game = Game::new(GameSettings::default()).unwrap();
        let initial: Vec<_> = game.events.score.iter().collect();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].score, 0);
        assert_eq!(initial[0].total, game.total_collectibles());
        assert_eq!(game.lives(), GameSettings::default().lives);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = GameSettings::default();
        settings.player.substeps = 0;
        assert!(Game::new(settings).is_err());
    }

    #[test]
    fn test_paused_game_does_not_simulate() {
        let mut game = Game::new(GameSettings::default()).unwrap();
        let start = game.player.position;
        for _ in 0..30 {
            game.frame(FIXED_STEP);
        }
        assert_eq!(game.player.position, start);
        assert_eq!(game.sim_time(), 0.0);
    }

    #[test]
    fn test_frame_consumes_whole_fixed_steps() {
        let mut game = running_game();
        game.frame(FIXED_STEP * 3.5);
        assert!((game.sim_time() - FIXED_STEP * 3.0).abs() < 1e-6);
        game.frame(FIXED_STEP * 0.6);
        assert!((game.sim_time() - FIXED_STEP * 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_pickup_is_idempotent_and_scores_once() {
        let mut game = running_game();
        let spot = game.collectibles[0].position;

        // Park the player on the pickup point
        game.player.position = spot;
        game.frame(FIXED_STEP);
        let after_first = game.score();
        assert!(after_first >= 1);
        assert!(!game.collectibles[0].active);
        let announced: Vec<_> = game.events.score.iter().cloned().collect();
        assert!(announced
            .iter()
            .any(|e| e.total == game.total_collectibles() && e.score >= 1));

        // Still standing in range; nothing further happens
        game.player.position = spot;
        game.frame(FIXED_STEP);
        game.player.position = spot;
        game.frame(FIXED_STEP);
        assert_eq!(game.score(), after_first);
    }

    #[test]
    fn test_falling_out_costs_one_life() {
        let mut game = running_game();
        let lives_before = game.lives();

        game.player.position = vec3(0.0, game.settings.player.kill_height - 1.0, 0.0);
        game.frame(FIXED_STEP);

        assert_eq!(game.lives(), lives_before - 1);
        let events: Vec<_> = game.events.lives.iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].remaining, lives_before - 1);
        assert_eq!(game.player.position, game.player.spawn_point());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut game = running_game();

        // Score one, lose a life, scatter some particles
        let spot = game.collectibles[0].position;
        game.player.position = spot;
        game.frame(FIXED_STEP);
        game.player.position = vec3(0.0, game.settings.player.kill_height - 1.0, 0.0);
        game.frame(FIXED_STEP);
        assert!(game.score() > 0);

        game.reset();
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), game.settings.lives);
        assert!(game.collectibles.iter().all(|c| c.active));
        assert_eq!(game.player.position, game.player.spawn_point());
        assert_eq!(game.particles.active_count(), 0);
        assert_eq!(game.sim_time(), 0.0);

        // Total re-announced for the observer
        let initial: Vec<_> = game.events.score.iter().collect();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].score, 0);
    }

    #[test]
    fn test_particle_conservation_through_play() {
        use crate::game::particles::PARTICLE_CAPACITY;

        let mut game = running_game();
        game.update_controls(ControlFlags {
            forward: true,
            sprint: true,
            jump: true,
            ..Default::default()
        });
        for _ in 0..240 {
            game.frame(FIXED_STEP);
            assert_eq!(
                game.particles.active_count() + game.particles.free_count(),
                PARTICLE_CAPACITY
            );
        }
    }

    #[test]
    fn test_resume_discards_backlog() {
        let mut game = running_game();
        game.frame(FIXED_STEP * 2.0);
        let simulated = game.sim_time();

        game.set_running(false);
        game.set_running(true);
        // The pause gap itself is gone; only new frames advance time
        game.frame(0.0);
        assert!((game.sim_time() - simulated).abs() < 1e-6);
    }
}
