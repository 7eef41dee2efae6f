//! The Tram
//!
//! The city's one moving platform. It shuttles along a straight street,
//! ping-ponging between two endpoints as a pure function of simulated
//! time, so its position never drifts and replays identically for a given
//! clock. Its velocity is measured from the per-step position delta; that
//! is what a rider standing on the roof inherits.

use macroquad::math::Vec3;

use crate::game::collision::Aabb;

pub struct Tram {
    start: Vec3,
    end: Vec3,
    speed: f32,
    half_extents: Vec3,
    position: Vec3,
    velocity: Vec3,
}

impl Tram {
    pub fn new(start: Vec3, end: Vec3, speed: f32, half_extents: Vec3) -> Self {
        Self {
            start,
            end,
            speed,
            half_extents,
            position: start,
            velocity: Vec3::ZERO,
        }
    }

    /// Center position at an absolute simulation time.
    pub fn route_position(&self, time: f32) -> Vec3 {
        let length = (self.end - self.start).length();
        if length <= f32::EPSILON || self.speed <= 0.0 {
            return self.start;
        }
        // Ping-pong parameter along the route
        let travelled = (time * self.speed).rem_euclid(2.0 * length);
        let along = if travelled > length {
            2.0 * length - travelled
        } else {
            travelled
        };
        self.start + (self.end - self.start) * (along / length)
    }

    /// Advance to the given simulation time. `dt` is the step that led
    /// here; the measured position delta over it becomes the velocity.
    pub fn advance(&mut self, time: f32, dt: f32) {
        let next = self.route_position(time);
        self.velocity = if dt > 0.0 {
            (next - self.position) / dt
        } else {
            Vec3::ZERO
        };
        self.position = next;
    }

    /// Snap back to the route start. Used on game reset.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.velocity = Vec3::ZERO;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Instantaneous velocity inherited by riders.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.half_extents * 2.0)
    }
}
