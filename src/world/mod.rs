//! World Generation
//!
//! Builds the city the simulation runs in: the static collider list, the
//! tram route, collectible placements and the spawn point. Generation is
//! seeded and fully deterministic, so the same settings always produce the
//! same city. Only collision-relevant output lives here; how the city is
//! drawn is the renderer's business.

pub mod city;
pub mod tram;

pub use city::{generate, CityPlan};
pub use tram::Tram;
