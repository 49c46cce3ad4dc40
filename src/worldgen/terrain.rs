use crate::spatial::TilePos;
use crate::world::Terrain;

use super::hash::{hash2, jitter};

const CONTINENTAL_WEIGHT: f64 = 0.60;
const LATITUDE_WEIGHT: f64 = 0.15;
const ELEVATION_WEIGHT: f64 = 0.10;
const EQUATOR_FAVOR: f64 = 0.30;
const HARSHNESS_JITTER: f64 = 0.05;
const HARSHNESS_JITTER_OFFSET: (i32, i32) = (7, 9);

const RESOURCE_MAX: f64 = 1.6;
const RESOURCE_MIN: f64 = 0.3;
const RESOURCE_SPREAD: f64 = 0.2;
const RESOURCE_JITTER_OFFSET: (i32, i32) = (17, 23);

/// Inputs the classifier needs for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellClimate {
    pub elevation: f64,
    pub is_sea: bool,
    /// Normalised distance from the coast, `[0, 1]`.
    pub continentality: f64,
    /// 0 at the equator row, 1 at the poles.
    pub latitude: f64,
}

/// Suitability score before jitter; higher is worse. May fall outside `[0, 1]`.
pub fn base_harshness(climate: &CellClimate) -> f64 {
    climate.continentality * CONTINENTAL_WEIGHT
        + climate.latitude * LATITUDE_WEIGHT
        + climate.elevation * ELEVATION_WEIGHT
        - (1.0 - climate.latitude) * EQUATOR_FAVOR
}

/// Quantise a harshness score into one of the six land tiers.
pub fn land_tier(harshness: f64) -> Terrain {
    let h = harshness.clamp(0.0, 1.0);
    let tier = (1.0 + (h * Terrain::LAND_TIERS as f64).floor()) as u8;
    Terrain::land(tier.clamp(1, Terrain::LAND_TIERS))
}

pub fn classify(pos: TilePos, climate: &CellClimate, seed: i32) -> Terrain {
    if climate.is_sea {
        return Terrain::SEA;
    }
    let harshness = base_harshness(climate)
        + jitter(
            (pos.x as i32).wrapping_add(HARSHNESS_JITTER_OFFSET.0),
            (pos.y as i32).wrapping_add(HARSHNESS_JITTER_OFFSET.1),
            seed,
            HARSHNESS_JITTER,
        );
    land_tier(harshness)
}

/// Expected yield of a tier before per-cell variation: 1.6 for tier 1 down to 0.3 for tier 6.
pub fn base_resource(terrain: Terrain) -> f64 {
    let rank = (terrain.tier() - 1) as f64;
    RESOURCE_MAX - (RESOURCE_MAX - RESOURCE_MIN) * (rank / 5.0)
}

/// Per-cell yield, rounded to cents. Sea cells get a nominal value that
/// consumers must ignore.
pub fn resource(terrain: Terrain, pos: TilePos, seed: i32) -> f64 {
    let noise = hash2(
        (pos.x as i32).wrapping_add(RESOURCE_JITTER_OFFSET.0),
        (pos.y as i32).wrapping_add(RESOURCE_JITTER_OFFSET.1),
        seed,
    );
    let factor = 1.0 - RESOURCE_SPREAD / 2.0 + noise * RESOURCE_SPREAD;
    round2(base_resource(terrain) * factor)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
