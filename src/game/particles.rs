//! Particle Subsystem
//!
//! Transient visual effects from a fixed-size pool: landing dust, jump
//! puffs, sprint kicks, pickup sparkles, wall-slide grit. A slot is free
//! exactly when its lifetime is non-positive, so the pool never allocates
//! after construction and the active + free count always equals capacity.

use macroquad::color::Color;
use macroquad::math::{vec3, Vec3};

/// Pool capacity. Emission beyond this silently drops the overflow.
pub const PARTICLE_CAPACITY: usize = 160;

/// Downward acceleration applied to every live particle.
const PARTICLE_GRAVITY: f32 = 9.0;

/// Scale shrink rate (fraction of start scale per second).
const SHRINK_RATE: f32 = 1.4;

/// One pooled particle slot. Live while `lifetime > 0`.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds remaining; the slot frees itself when this crosses zero
    pub lifetime: f32,
    pub scale: f32,
    pub color: Color,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            lifetime: 0.0,
            scale: 0.0,
            color: Color::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

impl Particle {
    pub fn is_active(&self) -> bool {
        self.lifetime > 0.0
    }
}

/// The particle pool. Fixed capacity, reusable slots.
pub struct ParticlePool {
    slots: [Particle; PARTICLE_CAPACITY],
    /// Xorshift PRNG state for emission randomization (deterministic)
    rng_state: u32,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self {
            slots: [Particle::default(); PARTICLE_CAPACITY],
            rng_state: 0x9E3779B9,
        }
    }

    fn next_random(&mut self) -> f32 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;
        (self.rng_state as f32) / (u32::MAX as f32)
    }

    fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_random() * (max - min)
    }

    /// Activate up to `count` free slots at `origin`. Partial or no-op when
    /// the pool is exhausted; never touches a live slot.
    pub fn emit(&mut self, origin: Vec3, count: usize, color: Color) {
        let mut remaining = count;
        for i in 0..self.slots.len() {
            if remaining == 0 {
                break;
            }
            if self.slots[i].is_active() {
                continue;
            }

            // Random direction in an upward-biased cone
            let theta = self.random_range(0.0, std::f32::consts::TAU);
            let spread = self.random_range(0.4, 1.6);
            let speed = self.random_range(1.0, 3.5);
            let velocity = vec3(
                theta.cos() * spread,
                self.random_range(1.2, 3.0),
                theta.sin() * spread,
            )
            .normalize()
                * speed;

            self.slots[i] = Particle {
                position: origin,
                velocity,
                lifetime: self.random_range(0.35, 0.8),
                scale: self.random_range(0.06, 0.14),
                color,
            };
            remaining -= 1;
        }
    }

    /// Advance every live particle; slots free themselves exactly when
    /// their lifetime crosses zero.
    pub fn tick(&mut self, dt: f32) {
        for slot in self.slots.iter_mut() {
            if !slot.is_active() {
                continue;
            }

            slot.lifetime -= dt;
            if slot.lifetime <= 0.0 {
                slot.lifetime = 0.0;
                continue;
            }

            slot.velocity.y -= PARTICLE_GRAVITY * dt;
            slot.position += slot.velocity * dt;
            slot.scale = (slot.scale - slot.scale * SHRINK_RATE * dt).max(0.005);
        }
    }

    /// Iterate the live particles, for rendering.
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter(|p| p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.is_active()).count()
    }

    pub fn free_count(&self) -> usize {
        PARTICLE_CAPACITY - self.active_count()
    }

    /// Kill every particle. Used on game reset.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.lifetime = 0.0;
        }
    }
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new()
    }
}
