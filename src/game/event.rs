//! Event System
//!
//! Typed queues decouple the physics step from everything that reacts to
//! it. The controller pushes gameplay events while it integrates; after the
//! fixed steps the runtime drains the ones it owns (particle bursts, score
//! and life accounting) and leaves the observer queues (`score`, `lives`)
//! for the surrounding application to read. Queues are cleared at the start
//! of the next frame, so observers always see a full frame's worth.

use macroquad::color::Color;
use macroquad::math::Vec3;

/// A queue for events of a single type.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate without clearing. Observers use this after the frame.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events, clearing the queue.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Event Types
// =============================================================================

/// The score changed, or the collectible total became known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEvent {
    pub score: u32,
    pub total: u32,
}

/// The player lost a life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivesEvent {
    pub remaining: u32,
}

/// A collectible was picked up this step.
#[derive(Debug, Clone, Copy)]
pub struct PickupEvent {
    pub position: Vec3,
}

/// The player left the ground under jump power.
#[derive(Debug, Clone, Copy)]
pub struct JumpedEvent {
    pub position: Vec3,
    /// True for double/triple jumps executed in the air
    pub aerial: bool,
}

/// The player kicked off a wall.
#[derive(Debug, Clone, Copy)]
pub struct WallJumpedEvent {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Airborne-to-grounded transition.
#[derive(Debug, Clone, Copy)]
pub struct LandedEvent {
    pub position: Vec3,
    /// Downward speed at the moment of contact
    pub impact_speed: f32,
}

/// The player fell below the world and was put back at spawn.
#[derive(Debug, Clone, Copy)]
pub struct FellOutEvent {
    pub position: Vec3,
}

/// A subsystem wants particles. The runtime forwards these to the pool.
#[derive(Debug, Clone, Copy)]
pub struct EmitRequest {
    pub position: Vec3,
    pub count: usize,
    pub color: Color,
}

/// Container for every queue the simulation uses.
pub struct Events {
    pub score: EventQueue<ScoreEvent>,
    pub lives: EventQueue<LivesEvent>,
    pub pickups: EventQueue<PickupEvent>,
    pub jumps: EventQueue<JumpedEvent>,
    pub wall_jumps: EventQueue<WallJumpedEvent>,
    pub landings: EventQueue<LandedEvent>,
    pub fell_out: EventQueue<FellOutEvent>,
    pub emit_requests: EventQueue<EmitRequest>,
}

impl Events {
    pub fn new() -> Self {
        Self {
            score: EventQueue::new(),
            lives: EventQueue::new(),
            pickups: EventQueue::new(),
            jumps: EventQueue::new(),
            wall_jumps: EventQueue::new(),
            landings: EventQueue::new(),
            fell_out: EventQueue::new(),
            emit_requests: EventQueue::new(),
        }
    }

    /// Clear every queue. Called at the start of each frame.
    pub fn clear_all(&mut self) {
        self.score.clear();
        self.lives.clear();
        self.pickups.clear();
        self.jumps.clear();
        self.wall_jumps.clear();
        self.landings.clear();
        self.fell_out.clear();
        self.emit_requests.clear();
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}
