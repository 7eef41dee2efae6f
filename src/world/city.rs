//! City Generator
//!
//! Lays out a square grid of building blocks separated by streets, with a
//! tram line down the central street. Every building, curb and crate
//! becomes one static collider; collectibles go on streets and rooftops.
//! The layout is a pure function of the seed in `WorldTuning`.

use macroquad::math::{vec3, Vec3};

use crate::game::collision::Aabb;
use crate::game::settings::WorldTuning;
use super::tram::Tram;

/// Ground slab thickness below street level.
const GROUND_DEPTH: f32 = 1.0;

/// Crate heights: low ones are steppable, tall ones demand a jump.
const CRATE_LOW: f32 = 0.45;
const CRATE_TALL: f32 = 1.1;

/// Everything the simulation needs from a generated city.
pub struct CityPlan {
    /// Static colliders, baked once
    pub colliders: Vec<Aabb>,
    pub tram: Tram,
    /// Collectible base positions (the pickup point)
    pub collectible_spots: Vec<Vec3>,
    pub spawn_point: Vec3,
    /// Building boxes only, for the renderer (subset of `colliders`)
    pub buildings: Vec<Aabb>,
}

/// Xorshift PRNG, seeded; zero state is nudged to keep the shifts alive.
struct LayoutRng(u32);

impl LayoutRng {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0xBADC0DE } else { seed })
    }

    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 as f32) / (u32::MAX as f32)
    }

    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    fn index(&mut self, len: usize) -> usize {
        ((self.next_f32() * len as f32) as usize).min(len.saturating_sub(1))
    }
}

/// Build the city described by `tuning`.
pub fn generate(tuning: &WorldTuning) -> CityPlan {
    let mut rng = LayoutRng::new(tuning.seed);

    let blocks = tuning.blocks as i32;
    let pitch = tuning.block_size + tuning.street_width;
    let extent = blocks as f32 * pitch + tuning.street_width;
    let half = extent * 0.5;

    let mut colliders = Vec::new();
    let mut buildings = Vec::new();

    // Ground slab under the whole city
    colliders.push(Aabb::new(
        vec3(-half, -GROUND_DEPTH, -half),
        vec3(half, 0.0, half),
    ));

    // The tram street runs along z through the central street line
    let tram_lane = blocks / 2;
    let street_x = |k: i32| -half + tuning.street_width * 0.5 + k as f32 * pitch;
    let tram_x = street_x(tram_lane);

    // One building per block, inset a little from the street edge
    for bx in 0..blocks {
        for bz in 0..blocks {
            let x0 = -half + tuning.street_width + bx as f32 * pitch;
            let z0 = -half + tuning.street_width + bz as f32 * pitch;
            let inset = rng.range(0.0, tuning.block_size * 0.15);
            let height = rng.range(tuning.min_height, tuning.max_height);

            let building = Aabb::new(
                vec3(x0 + inset, 0.0, z0 + inset),
                vec3(
                    x0 + tuning.block_size - inset,
                    height,
                    z0 + tuning.block_size - inset,
                ),
            );
            colliders.push(building);
            buildings.push(building);

            // Scatter a crate or two on the street corner by this block
            if rng.next_f32() < 0.6 {
                let tall = rng.next_f32() < 0.35;
                let h = if tall { CRATE_TALL } else { CRATE_LOW };
                let size = rng.range(0.8, 1.4);
                let cx = x0 - tuning.street_width * rng.range(0.3, 0.7);
                let cz = z0 + rng.range(0.0, tuning.block_size);
                // Keep the tram lane clear
                if (cx - tram_x).abs() > tuning.street_width * 0.5 + size {
                    colliders.push(Aabb::new(
                        vec3(cx - size * 0.5, 0.0, cz - size * 0.5),
                        vec3(cx + size * 0.5, h, cz + size * 0.5),
                    ));
                }
            }
        }
    }

    let tram = Tram::new(
        vec3(tram_x, 0.75, -half + 3.0),
        vec3(tram_x, 0.75, half - 3.0),
        tuning.tram_speed,
        vec3(1.2, 0.6, 2.5),
    );

    // Collectibles alternate between street level and rooftops
    let mut collectible_spots = Vec::with_capacity(tuning.collectibles as usize);
    for i in 0..tuning.collectibles {
        if i % 2 == 0 || buildings.is_empty() {
            let k = rng.index(blocks as usize + 1) as i32;
            let spot = vec3(
                street_x(k),
                0.5,
                rng.range(-half + 2.0, half - 2.0),
            );
            collectible_spots.push(spot);
        } else {
            let roof = &buildings[rng.index(buildings.len())];
            let c = roof.center();
            collectible_spots.push(vec3(c.x, roof.top() + 0.5, c.z));
        }
    }

    // Spawn on the tram street, clear of the tram's sweep, a little above
    // ground so the first steps settle onto it
    let spawn_point = vec3(tram_x + tuning.street_width * 0.38, 1.0, 0.0);

    CityPlan {
        colliders,
        tram,
        collectible_spots,
        spawn_point,
        buildings,
    }
}
