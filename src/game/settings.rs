//! Game Settings
//!
//! All tuning constants in one serde aggregate so a whole playthrough can
//! be described by a single RON file. Every field has a default, and files
//! may specify any subset; unknown combinations are caught by `validate`.

use serde::{Deserialize, Serialize};

/// Character movement and physics tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Collision sphere radius (the cat is squat, one sphere is enough)
    pub radius: f32,
    /// Maximum step-up height. Curbs and crates below this are floor.
    pub step_height: f32,
    /// Horizontal speed cap while walking (units per second)
    pub walk_speed: f32,
    /// Horizontal speed cap while sprinting
    pub sprint_speed: f32,
    /// Horizontal acceleration while grounded
    pub ground_accel: f32,
    /// Horizontal acceleration while airborne
    pub air_accel: f32,
    /// Friction coefficient on the ground (per second)
    pub ground_friction: f32,
    /// Friction coefficient in the air
    pub air_friction: f32,
    /// Gravity acceleration (positive, applied downward)
    pub gravity: f32,
    /// Gravity multiplier while sliding down a wall
    pub wall_slide_gravity: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,
    /// Upward velocity of a ground or aerial jump
    pub jump_force: f32,
    /// Total sequential jumps before landing (first + aerial)
    pub max_jumps: u8,
    /// Outward velocity a wall jump imparts along the wall normal
    pub wall_jump_push: f32,
    /// Upward velocity of a wall jump
    pub wall_jump_force: f32,
    /// Grace period after leaving ground during which a jump still counts
    /// as grounded (seconds)
    pub coyote_time: f32,
    /// How early a jump press may arrive before it can be honored
    pub jump_buffer: f32,
    /// Turn smoothing rate toward the movement direction
    pub turn_rate: f32,
    /// Sub-steps per fixed physics tick
    pub substeps: u8,
    /// Height below which the player has left the world
    pub kill_height: f32,
    /// Distance at which a collectible is picked up
    pub pickup_radius: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.35,
            step_height: 0.55,
            walk_speed: 6.0,
            sprint_speed: 10.0,
            ground_accel: 40.0,
            air_accel: 14.0,
            ground_friction: 10.0,
            air_friction: 1.5,
            gravity: 25.0,
            wall_slide_gravity: 0.3,     // Slow slide, not a full stop
            max_fall_speed: 30.0,
            jump_force: 9.0,
            max_jumps: 3,                // Jump, double, triple
            wall_jump_push: 7.0,
            wall_jump_force: 8.5,
            coyote_time: 0.12,
            jump_buffer: 0.15,
            turn_rate: 10.0,
            substeps: 4,
            kill_height: -10.0,
            pickup_radius: 0.9,
        }
    }
}

/// Follow camera tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Orbit distance behind the player
    pub distance: f32,
    /// Look-at height above the player's feet
    pub eye_height: f32,
    /// Minimum pitch (looking up, radians)
    pub pitch_min: f32,
    /// Maximum pitch (looking down)
    pub pitch_max: f32,
    /// Pointer-delta to radians factor
    pub look_sensitivity: f32,
    /// Exponential damping rate for the camera position
    pub position_damping: f32,
    /// Exponential damping rate for the look-at target
    pub target_damping: f32,
    /// Seconds of horizontal velocity the look-at leads by
    pub look_ahead: f32,
    /// Gap kept between the camera and an occluding collider
    pub occlusion_margin: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            distance: 7.0,
            eye_height: 0.8,
            pitch_min: -1.2,
            pitch_max: 1.35,             // Stop short of vertical
            look_sensitivity: 0.0035,
            position_damping: 10.0,
            target_damping: 14.0,
            look_ahead: 0.25,
            occlusion_margin: 0.3,
        }
    }
}

/// City generation tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// PRNG seed; the same seed builds the same city
    pub seed: u32,
    /// City blocks per side
    pub blocks: u32,
    /// Building footprint edge length
    pub block_size: f32,
    /// Street width between blocks
    pub street_width: f32,
    /// Minimum building height
    pub min_height: f32,
    /// Maximum building height
    pub max_height: f32,
    /// Collectibles to scatter
    pub collectibles: u32,
    /// Tram travel speed along its street
    pub tram_speed: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            seed: 0xCA7,
            blocks: 6,
            block_size: 12.0,
            street_width: 6.0,
            min_height: 3.0,
            max_height: 16.0,
            collectibles: 24,
            tram_speed: 4.0,
        }
    }
}

/// Top-level settings aggregate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub player: PlayerTuning,
    pub camera: CameraTuning,
    pub world: WorldTuning,
    /// Lives per session
    pub lives: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            camera: CameraTuning::default(),
            world: WorldTuning::default(),
            lives: 9,                    // A cat's allotment
        }
    }
}

impl GameSettings {
    /// Sanity-check a settings aggregate before it reaches the simulation.
    pub fn validate(&self) -> Result<(), String> {
        if self.player.radius <= 0.0 {
            return Err("player.radius must be positive".to_string());
        }
        if self.player.substeps == 0 {
            return Err("player.substeps must be at least 1".to_string());
        }
        if self.player.max_jumps == 0 {
            return Err("player.max_jumps must be at least 1".to_string());
        }
        if self.player.walk_speed <= 0.0 || self.player.sprint_speed < self.player.walk_speed {
            return Err("speed caps must satisfy 0 < walk_speed <= sprint_speed".to_string());
        }
        if self.camera.pitch_min >= self.camera.pitch_max {
            return Err("camera.pitch_min must be below camera.pitch_max".to_string());
        }
        if self.camera.distance <= self.camera.occlusion_margin {
            return Err("camera.distance must exceed camera.occlusion_margin".to_string());
        }
        if self.world.blocks == 0 {
            return Err("world.blocks must be at least 1".to_string());
        }
        if self.world.min_height > self.world.max_height {
            return Err("world.min_height must not exceed world.max_height".to_string());
        }
        Ok(())
    }

    /// Parse settings from RON text and validate them.
    pub fn from_ron(text: &str) -> Result<Self, String> {
        let settings: GameSettings =
            ron::from_str(text).map_err(|e| format!("settings parse error: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a RON file, if one exists. Missing file is not an
    /// error; a malformed or invalid file is.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &str) -> Result<Option<Self>, String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("failed to read {}: {}", path, e)),
        }
    }
}
