//! Collision System
//!
//! Axis-aligned boxes only. The city generator bakes every static collider
//! once at world build; the tram is the lone moving box and is refreshed
//! each fixed step. The player is a sphere resting on its "feet" point:
//! contacts are found by the closest-point-on-box test, corrected along the
//! contact normal, and classified as ground, ceiling or wall by how
//! vertical that normal is. Low obstacles under the step-up height are
//! treated as floor so the cat can hop onto curbs and crates without a
//! dedicated climb move.

use macroquad::math::{vec3, Vec3};

/// A contact normal at least this vertical counts as ground.
pub const GROUND_NORMAL_Y: f32 = 0.7;

/// Below this separation the closest-point direction is numerically
/// meaningless, so correction is skipped for that contact.
const DEGENERATE_DISTANCE: f32 = 1e-5;

/// Ground contacts register within this skin even without penetration,
/// so a player resting exactly on a surface stays grounded.
const GROUND_SKIN: f32 = 0.02;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Height of the walkable top surface.
    pub fn top(&self) -> f32 {
        self.max.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Closest point on or inside the box to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Slab-method ray intersection. Returns the entry distance along the
    /// (normalized) direction if the ray hits within `max_t`.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_t: f32) -> Option<f32> {
        let mut t_near = 0.0f32;
        let mut t_far = max_t;

        for axis in 0..3 {
            let (o, d, lo, hi) = match axis {
                0 => (origin.x, direction.x, self.min.x, self.max.x),
                1 => (origin.y, direction.y, self.min.y, self.max.y),
                _ => (origin.z, direction.z, self.min.z, self.max.z),
            };
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a < b {
                    (a, b)
                } else {
                    (b, a)
                }
            };
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        Some(t_near)
    }
}

/// Result of resolving one sub-step of player motion against the registry.
#[derive(Debug, Clone, Copy)]
pub struct ResolveResult {
    /// Corrected feet position
    pub position: Vec3,
    pub grounded: bool,
    pub hit_ceiling: bool,
    pub touching_wall: bool,
    /// Outward normal of the touched wall, horizontal, normalized.
    /// Only meaningful while `touching_wall` is set.
    pub wall_normal: Vec3,
}

/// Contact classification against the tram's specialized test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformContact {
    None,
    /// Standing on the top surface; feet snapped to it
    Top,
    /// Pushed out of the side; carries the outward horizontal normal
    Side(Vec3),
}

/// The flat collider registry the whole simulation shares.
///
/// Static boxes are immutable after world build. Moving boxes are replaced
/// wholesale whenever their owners advance, so nothing here is ever stale
/// by more than one fixed step.
pub struct ColliderSet {
    statics: Vec<Aabb>,
    moving: Vec<Aabb>,
}

impl ColliderSet {
    pub fn new(statics: Vec<Aabb>) -> Self {
        Self {
            statics,
            moving: Vec::new(),
        }
    }

    pub fn statics(&self) -> &[Aabb] {
        &self.statics
    }

    /// Replace the moving-collider list for this step.
    pub fn set_moving(&mut self, boxes: &[Aabb]) {
        self.moving.clear();
        self.moving.extend_from_slice(boxes);
    }

    /// Nearest hit distance along a ray against every collider.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_t: f32) -> Option<f32> {
        let mut nearest: Option<f32> = None;
        for b in self.statics.iter().chain(self.moving.iter()) {
            if let Some(t) = b.raycast(origin, direction, max_t) {
                nearest = Some(nearest.map_or(t, |n: f32| n.min(t)));
            }
        }
        nearest
    }
}

/// Resolve the player sphere against every static collider near it.
///
/// `position` is the feet point; the collision sphere is centered one
/// radius above it. `vertical_velocity` classifies ambiguous contacts:
/// only a non-rising player can land or step up.
pub fn resolve_sphere(
    position: Vec3,
    radius: f32,
    step_height: f32,
    vertical_velocity: f32,
    colliders: &ColliderSet,
) -> ResolveResult {
    let mut result = ResolveResult {
        position,
        grounded: false,
        hit_ceiling: false,
        touching_wall: false,
        wall_normal: Vec3::ZERO,
    };

    let region = Aabb::from_center_size(
        position + Vec3::Y * radius,
        Vec3::splat((radius + step_height) * 2.0),
    );

    let detect = radius + GROUND_SKIN;
    for b in colliders.statics.iter().filter(|b| b.overlaps(&region)) {
        let center = result.position + Vec3::Y * radius;
        let closest = b.closest_point(center);
        let offset = center - closest;
        let dist_sq = offset.length_squared();
        if dist_sq >= detect * detect {
            continue;
        }

        let dist = dist_sq.sqrt();
        if dist < DEGENERATE_DISTANCE {
            // Sphere center inside the box; no usable normal
            continue;
        }
        let normal = offset / dist;

        if dist >= radius {
            // Inside the skin only: enough to rest on, never to push
            if vertical_velocity <= 0.0 && normal.y >= GROUND_NORMAL_Y {
                result.position.y = b.top();
                result.grounded = true;
            }
            continue;
        }
        let penetration = radius - dist;

        let ledge = b.top() - result.position.y;
        if vertical_velocity <= 0.0 && normal.y >= GROUND_NORMAL_Y {
            result.position.y = b.top();
            result.grounded = true;
        } else if vertical_velocity <= 0.0 && ledge > 0.0 && ledge <= step_height {
            // Low obstacle: floor, not wall
            result.position.y = b.top();
            result.grounded = true;
        } else if normal.y <= -GROUND_NORMAL_Y {
            result.position += normal * penetration;
            result.hit_ceiling = true;
        } else {
            let lateral = vec3(normal.x, 0.0, normal.z);
            let len = lateral.length();
            if len < DEGENERATE_DISTANCE {
                continue;
            }
            let wall_normal = lateral / len;
            result.position += wall_normal * penetration;
            result.touching_wall = true;
            result.wall_normal = wall_normal;
        }
    }

    result
}

/// Specialized moving-platform test: land on the top surface when falling
/// onto it, otherwise push out of the sides. Returns what happened so the
/// caller can inherit the platform's velocity on a `Top` contact.
pub fn resolve_platform(
    position: &mut Vec3,
    radius: f32,
    step_height: f32,
    vertical_velocity: f32,
    platform: &Aabb,
) -> PlatformContact {
    let over_top = position.x >= platform.min.x - radius
        && position.x <= platform.max.x + radius
        && position.z >= platform.min.z - radius
        && position.z <= platform.max.z + radius;

    if over_top
        && vertical_velocity <= 0.0
        && position.y >= platform.top() - step_height
        && position.y <= platform.top() + radius
    {
        position.y = platform.top();
        return PlatformContact::Top;
    }

    let center = *position + Vec3::Y * radius;
    let closest = platform.closest_point(center);
    let offset = center - closest;
    let dist_sq = offset.length_squared();
    if dist_sq >= radius * radius {
        return PlatformContact::None;
    }

    let lateral = vec3(offset.x, 0.0, offset.z);
    let len = lateral.length();
    if len < DEGENERATE_DISTANCE {
        return PlatformContact::None;
    }
    let normal = lateral / len;
    *position += normal * (radius - dist_sq.sqrt());
    PlatformContact::Side(normal)
}
