//! Deterministic procedural world generation.
//!
//! A world is a pure function of `(width, height, seed)`: gradient-noise
//! elevation biased towards land at the equator, a sea mask, the distance of
//! each land cell from the coast, and finally a terrain tier and resource
//! yield per cell.

pub mod distance;
pub mod elevation;
pub mod hash;
pub mod noise;
pub mod terrain;

use thiserror::Error;

use crate::spatial::{TileGrid, TilePos};
use crate::store::StoreError;
use crate::world::{Terrain, TileRecord};

pub use distance::{distance_to_sea, CoastDistance};
pub use elevation::{ElevationMap, SEA_THRESHOLD};
pub use hash::{hash2, DEFAULT_SEED};
pub use terrain::CellClimate;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("world dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("generated {width}x{height} world has no sea; continentality is undefined")]
    NoSea { width: u32, height: u32 },
    #[error("storage failed during generation: {0}")]
    Store(#[from] StoreError),
}

/// Fully computed generation fields for one world.
///
/// Building it runs every whole-grid pass; tiles are then derived cell by cell.
pub struct WorldGenerator {
    grid: TileGrid,
    seed: i32,
    elevation: ElevationMap,
    coast: CoastDistance,
}

impl WorldGenerator {
    pub fn new(width: u32, height: u32, seed: i32) -> Result<Self, GenerationError> {
        if width == 0 || height == 0 {
            return Err(GenerationError::InvalidDimensions { width, height });
        }
        let grid = TileGrid::new(width, height);
        let elevation = ElevationMap::generate(grid, seed);
        Self::from_elevation(elevation, seed)
    }

    /// Build from a precomputed elevation map, e.g. a hand-drawn sea mask.
    pub fn from_elevation(elevation: ElevationMap, seed: i32) -> Result<Self, GenerationError> {
        let grid = elevation.grid();
        let coast = distance_to_sea(&elevation.sea)?;
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            sea = elevation.sea_count(),
            land = grid.cell_count() - elevation.sea_count(),
            max_distance = coast.max_distance,
            "worldgen.fields"
        );
        Ok(Self {
            grid,
            seed,
            elevation,
            coast,
        })
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn elevation(&self) -> &ElevationMap {
        &self.elevation
    }

    pub fn coast(&self) -> &CoastDistance {
        &self.coast
    }

    pub fn climate(&self, pos: TilePos) -> CellClimate {
        CellClimate {
            elevation: self.elevation.elevation[pos],
            is_sea: self.elevation.sea[pos],
            continentality: self.coast.continentality(self.coast.distance[pos]),
            latitude: self.grid.latitude(pos.y),
        }
    }

    pub fn terrain(&self, pos: TilePos) -> Terrain {
        terrain::classify(pos, &self.climate(pos), self.seed)
    }

    pub fn tile(&self, pos: TilePos) -> TileRecord {
        let terrain = self.terrain(pos);
        let resource = terrain::resource(terrain, pos, self.seed);
        TileRecord::unclaimed(pos.x, pos.y, terrain, resource)
    }

    /// Every tile exactly once, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = TileRecord> + '_ {
        self.grid.positions().map(move |pos| self.tile(pos))
    }
}

/// Generate a whole world in memory.
pub fn generate(width: u32, height: u32, seed: i32) -> Result<Vec<TileRecord>, GenerationError> {
    let generator = WorldGenerator::new(width, height, seed)?;
    Ok(generator.tiles().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Field;

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(
            WorldGenerator::new(0, 10, DEFAULT_SEED),
            Err(GenerationError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(matches!(
            generate(10, 0, DEFAULT_SEED),
            Err(GenerationError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn contrived_mask_classifies_sea_and_land() {
        let grid = TileGrid::new(4, 4);
        let elevation = ElevationMap {
            elevation: Field::from_fn(grid, |pos| if pos.y == 0 { 0.1 } else { 0.8 }),
            sea: Field::from_fn(grid, |pos| pos.y == 0),
        };
        let generator = WorldGenerator::from_elevation(elevation, DEFAULT_SEED).unwrap();
        assert_eq!(generator.coast().max_distance, 3);

        let tiles: Vec<_> = generator.tiles().collect();
        assert_eq!(tiles.len(), 16);
        for tile in &tiles {
            assert_eq!(tile.terrain.is_sea(), tile.y == 0);
            assert!(tile.resource > 0.0);
        }
        // Deepest row is the most continental.
        let pos = TilePos { x: 2, y: 3 };
        assert_eq!(generator.climate(pos).continentality, 1.0);
    }

    #[test]
    fn small_world_is_reproducible() {
        let a = generate(48, 32, 99).unwrap();
        let b = generate(48, 32, 99).unwrap();
        assert_eq!(a, b);
    }
}
