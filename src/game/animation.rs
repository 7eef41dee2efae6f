//! Procedural Animator
//!
//! Derives the cat's visual pose from physics state alone. Nothing here
//! feeds back into the simulation: the animator reads the controller,
//! advances its own phase machine and rig, and at most asks the particle
//! pool for dust. Limb motion is a few phased sinusoids; squash and
//! stretch are transient scale targets eased back to neutral by explicit
//! countdown state, never by detached timers.

use macroquad::color::Color;
use macroquad::math::{vec3, Vec3};

use super::controller::CharacterController;
use super::event::{EmitRequest, Events};

pub const TAIL_SEGMENTS: usize = 4;

/// How long the landing squash phase lasts before idle/running resumes.
const LANDING_DURATION: f32 = 0.2;

/// Easing rate for the body stretch target.
const STRETCH_EASE: f32 = 12.0;

/// Stochastic emission rates, requests per second.
const SPRINT_DUST_RATE: f32 = 9.0;
const WALL_GRIT_RATE: f32 = 14.0;

const DUST: Color = Color::new(0.78, 0.74, 0.66, 1.0);
const GRIT: Color = Color::new(0.55, 0.55, 0.58, 1.0);

/// Visual phase of the character, selected from physics state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Idle,
    Running,
    Jumping,
    Falling,
    Landing,
    WallSliding,
}

/// Model-local pose of one animatable part.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartPose {
    pub offset: Vec3,
    /// Swing or sway rotation, radians
    pub angle: f32,
}

/// The cat's rig: one named, typed slot per part the renderer draws.
#[derive(Debug, Clone, Copy)]
pub struct CatRig {
    pub body: PartPose,
    /// Vertical body scale; above 1 stretched in flight, below 1 squashed
    /// on landing
    pub body_stretch: f32,
    pub head: PartPose,
    pub left_ear: PartPose,
    pub right_ear: PartPose,
    pub front_left_leg: PartPose,
    pub front_right_leg: PartPose,
    pub back_left_leg: PartPose,
    pub back_right_leg: PartPose,
    pub tail: [PartPose; TAIL_SEGMENTS],
}

impl Default for CatRig {
    fn default() -> Self {
        Self {
            body: PartPose::default(),
            body_stretch: 1.0,
            head: PartPose::default(),
            left_ear: PartPose::default(),
            right_ear: PartPose::default(),
            front_left_leg: PartPose::default(),
            front_right_leg: PartPose::default(),
            back_left_leg: PartPose::default(),
            back_right_leg: PartPose::default(),
            tail: [PartPose::default(); TAIL_SEGMENTS],
        }
    }
}

pub struct Animator {
    pub phase: MotionPhase,
    /// Seconds spent in the current phase
    pub phase_time: f32,
    pub rig: CatRig,
    run_cycle: f32,
    sway_time: f32,
    rng_state: u32,
}

impl Animator {
    pub fn new() -> Self {
        Self {
            phase: MotionPhase::Idle,
            phase_time: 0.0,
            rig: CatRig::default(),
            run_cycle: 0.0,
            sway_time: 0.0,
            rng_state: 0x5EED_CA7,
        }
    }

    pub fn reset(&mut self) {
        *self = Self {
            rng_state: self.rng_state,
            ..Self::new()
        };
    }

    fn next_random(&mut self) -> f32 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;
        (self.rng_state as f32) / (u32::MAX as f32)
    }

    /// Advance phase and rig from the player's current physics state.
    pub fn update(
        &mut self,
        player: &CharacterController,
        sprinting: bool,
        dt: f32,
        events: &mut Events,
    ) {
        self.advance_phase(player, dt);

        let speed = player.horizontal_speed();
        self.run_cycle += speed * 1.8 * dt;
        self.sway_time += dt * (1.0 + speed * 0.15);

        self.pose_body(speed, dt);
        self.pose_legs(speed);
        self.pose_tail_and_ears(player.turn_rate, speed);
        self.request_particles(player, sprinting, dt, events);
    }

    fn advance_phase(&mut self, player: &CharacterController, dt: f32) {
        let next = if player.grounded {
            let was_airborne = matches!(
                self.phase,
                MotionPhase::Jumping | MotionPhase::Falling | MotionPhase::WallSliding
            );
            if was_airborne {
                MotionPhase::Landing
            } else if self.phase == MotionPhase::Landing && self.phase_time < LANDING_DURATION {
                MotionPhase::Landing
            } else if player.horizontal_speed() > 0.5 {
                MotionPhase::Running
            } else {
                MotionPhase::Idle
            }
        } else if player.wall_sliding() {
            MotionPhase::WallSliding
        } else if player.velocity.y > 0.0 {
            MotionPhase::Jumping
        } else {
            MotionPhase::Falling
        };

        if next == self.phase {
            self.phase_time += dt;
        } else {
            self.phase = next;
            self.phase_time = 0.0;
        }
    }

    fn pose_body(&mut self, speed: f32, dt: f32) {
        let stretch_target = match self.phase {
            MotionPhase::Jumping => 1.18,
            MotionPhase::Falling => 1.08,
            // Squash hardest right at touchdown, relaxing over the phase
            MotionPhase::Landing => 0.78 + 0.22 * (self.phase_time / LANDING_DURATION).min(1.0),
            _ => 1.0,
        };
        let ease = 1.0 - (-STRETCH_EASE * dt).exp();
        self.rig.body_stretch += (stretch_target - self.rig.body_stretch) * ease;

        let bob = match self.phase {
            MotionPhase::Idle => (self.phase_time * 2.0).sin() * 0.02,
            MotionPhase::Running => (self.run_cycle * 2.0).sin().abs() * 0.015 * (speed * 0.2).min(1.0),
            _ => 0.0,
        };
        self.rig.body.offset = vec3(0.0, bob, 0.0);
        self.rig.head.offset = vec3(0.0, -bob * 0.5, 0.0);
    }

    fn pose_legs(&mut self, speed: f32) {
        let (amplitude, phase) = match self.phase {
            MotionPhase::Running => ((speed * 0.12).min(0.9), self.run_cycle),
            // Legs tuck forward in flight
            MotionPhase::Jumping | MotionPhase::Falling | MotionPhase::WallSliding => (0.5, 0.0),
            _ => (0.0, 0.0),
        };

        let swing = if self.phase == MotionPhase::Running {
            phase.sin() * amplitude
        } else {
            amplitude
        };
        // Diagonal pairs move together, each pair opposite the other
        self.rig.front_left_leg.angle = swing;
        self.rig.back_right_leg.angle = swing;
        self.rig.front_right_leg.angle = -swing;
        self.rig.back_left_leg.angle = -swing;
    }

    fn pose_tail_and_ears(&mut self, turn_rate: f32, speed: f32) {
        let amplitude = 0.18 + (speed * 0.035).min(0.35);
        let lean = (turn_rate * 0.12).clamp(-0.6, 0.6);
        for (i, segment) in self.rig.tail.iter_mut().enumerate() {
            // Neighboring segments lag each other to read as a chain
            let segment_phase = self.sway_time * 3.0 - i as f32 * 0.7;
            let falloff = 1.0 + i as f32 * 0.35;
            segment.angle = segment_phase.sin() * amplitude / falloff + lean;
        }

        let flick = (self.sway_time * 4.1).sin() * 0.05;
        self.rig.left_ear.angle = flick + lean * 0.3;
        self.rig.right_ear.angle = -flick + lean * 0.3;
    }

    /// Sprinting kicks up dust; wall slides shed grit. Stochastic so the
    /// streams look ragged instead of metronomic.
    fn request_particles(
        &mut self,
        player: &CharacterController,
        sprinting: bool,
        dt: f32,
        events: &mut Events,
    ) {
        if sprinting && player.grounded && player.horizontal_speed() > 1.0 {
            if self.next_random() < SPRINT_DUST_RATE * dt {
                events.emit_requests.send(EmitRequest {
                    position: player.position,
                    count: 1,
                    color: DUST,
                });
            }
        }
        if player.wall_sliding() && self.next_random() < WALL_GRIT_RATE * dt {
            events.emit_requests.send(EmitRequest {
                position: player.position - player.wall_normal * 0.3 + Vec3::Y * 0.3,
                count: 1,
                color: GRIT,
            });
        }
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}
