//! Camera Rig
//!
//! Third-person orbit camera. Pointer deltas steer yaw and pitch; each
//! frame the rig computes a desired position behind the player, pulls it in
//! front of anything the sight line would clip through, and exponentially
//! damps both the eye and the look-at target toward their desired spots.
//! Damping hides the discrete physics ticks; the look-ahead bias keeps the
//! frame centered slightly ahead of a sprinting player.

use macroquad::math::{vec3, Vec2, Vec3};

use super::collision::ColliderSet;
use super::settings::CameraTuning;

/// The camera never tucks closer than this, occlusion or not.
const MIN_DISTANCE: f32 = 0.6;

pub struct FollowCamera {
    /// Orbit yaw around the player, radians. Free-spinning.
    pub yaw: f32,
    /// Orbit pitch, clamped to the tuning range
    pub pitch: f32,
    /// Smoothed eye position
    pub position: Vec3,
    /// Smoothed focus point
    pub look_at: Vec3,
    look_ahead: Vec3,
}

impl FollowCamera {
    /// Place the rig behind a player at `player_pos`, already settled.
    pub fn new(player_pos: Vec3, tuning: &CameraTuning) -> Self {
        let mut camera = Self {
            yaw: 0.0,
            pitch: 0.35,
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
            look_ahead: Vec3::ZERO,
        };
        camera.snap_to(player_pos, tuning);
        camera
    }

    /// Rotate from a pointer delta. Yaw wraps; pitch clamps short of
    /// vertical so the orbit can never flip.
    pub fn apply_pointer_delta(&mut self, delta: Vec2, tuning: &CameraTuning) {
        self.yaw = (self.yaw - delta.x * tuning.look_sensitivity).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta.y * tuning.look_sensitivity)
            .clamp(tuning.pitch_min, tuning.pitch_max);
    }

    /// Advance the smoothed state one rendered frame.
    pub fn update(
        &mut self,
        player_pos: Vec3,
        player_vel: Vec3,
        colliders: &ColliderSet,
        tuning: &CameraTuning,
        dt: f32,
    ) {
        let target = player_pos + Vec3::Y * tuning.eye_height;

        // Focus drifts toward where the player is heading
        let desired_ahead = vec3(player_vel.x, 0.0, player_vel.z) * tuning.look_ahead;
        self.look_ahead += (desired_ahead - self.look_ahead) * damp_factor(tuning.target_damping, dt);
        let focus = target + self.look_ahead;

        let desired = self.desired_position(target, colliders, tuning);

        self.position += (desired - self.position) * damp_factor(tuning.position_damping, dt);
        self.look_at += (focus - self.look_at) * damp_factor(tuning.target_damping, dt);
    }

    /// Desired eye position after the occlusion pull-in.
    fn desired_position(&self, target: Vec3, colliders: &ColliderSet, tuning: &CameraTuning) -> Vec3 {
        let dir = vec3(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        );

        let mut distance = tuning.distance;
        if let Some(hit) = colliders.raycast(target, dir, distance) {
            distance = (hit - tuning.occlusion_margin).max(MIN_DISTANCE);
        }
        target + dir * distance
    }

    /// Jump straight to the desired pose, skipping the damping. Used at
    /// spawn and on reset so the camera does not swoop across the city.
    pub fn snap_to(&mut self, player_pos: Vec3, tuning: &CameraTuning) {
        let target = player_pos + Vec3::Y * tuning.eye_height;
        self.look_ahead = Vec3::ZERO;
        let empty = ColliderSet::new(Vec::new());
        self.position = self.desired_position(target, &empty, tuning);
        self.look_at = target;
    }

    /// Horizontal forward direction, the movement frame for input.
    pub fn forward_xz(&self) -> Vec3 {
        vec3(self.yaw.sin(), 0.0, self.yaw.cos())
    }
}

/// Fraction of the remaining distance covered this frame at `rate`.
fn damp_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}
