use crate::spatial::{Field, TileGrid, TilePos};

use super::hash::jitter;
use super::noise::Fbm;

/// Elevation below which a cell is sea.
pub const SEA_THRESHOLD: f64 = 0.52;

const EQUATOR_BONUS: f64 = 0.10;
const POLAR_PENALTY: f64 = 0.03;
const COAST_JITTER: f64 = 0.01;
const COAST_JITTER_OFFSET: (i32, i32) = (31, 47);

/// Elevation and sea mask for the whole grid, decided in one pass.
#[derive(Debug, Clone)]
pub struct ElevationMap {
    pub elevation: Field<f64>,
    pub sea: Field<bool>,
}

impl ElevationMap {
    pub fn generate(grid: TileGrid, seed: i32) -> Self {
        let fbm = Fbm::default();
        let elevation = Field::from_fn(grid, |pos| elevation_at(&fbm, grid, pos, seed));
        let sea = Field::from_fn(grid, |pos| is_sea(elevation[pos]));
        Self { elevation, sea }
    }

    pub fn grid(&self) -> TileGrid {
        self.elevation.grid()
    }

    pub fn sea_count(&self) -> usize {
        self.sea.as_slice().iter().filter(|&&sea| sea).count()
    }
}

pub fn is_sea(elevation: f64) -> bool {
    elevation < SEA_THRESHOLD
}

/// Noise with the equator lifted and the poles lowered, clamped to `[0, 1]`.
pub fn elevation_at(fbm: &Fbm, grid: TileGrid, pos: TilePos, seed: i32) -> f64 {
    let (x, y) = (pos.x as i32, pos.y as i32);
    let lat = grid.latitude(pos.y);

    let mut e = fbm.sample_unit(pos.x as f64, pos.y as f64, seed);
    e += (1.0 - lat) * EQUATOR_BONUS;
    e -= lat * POLAR_PENALTY;
    e += jitter(
        x.wrapping_add(COAST_JITTER_OFFSET.0),
        y.wrapping_add(COAST_JITTER_OFFSET.1),
        seed,
        COAST_JITTER,
    );
    e.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::hash::DEFAULT_SEED;

    #[test]
    fn elevation_is_clamped() {
        let map = ElevationMap::generate(TileGrid::new(120, 60), DEFAULT_SEED);
        assert!(map
            .elevation
            .as_slice()
            .iter()
            .all(|e| (0.0..=1.0).contains(e)));
    }

    #[test]
    fn sea_mask_follows_threshold() {
        let grid = TileGrid::new(80, 40);
        let map = ElevationMap::generate(grid, 5);
        for pos in grid.positions() {
            assert_eq!(map.sea[pos], map.elevation[pos] < SEA_THRESHOLD);
        }
    }

    #[test]
    fn equator_is_raised_relative_to_pole() {
        // Same noise sample, different latitude: the bias alone must favour land
        // at the equator.
        let fbm = Fbm {
            octaves: 0,
            ..Fbm::default()
        };
        let grid = TileGrid::new(1, 101);
        let equator = elevation_at(&fbm, grid, TilePos { x: 0, y: 50 }, DEFAULT_SEED);
        let pole = elevation_at(&fbm, grid, TilePos { x: 0, y: 0 }, DEFAULT_SEED);
        assert!(equator > pole + 0.1, "{equator} vs {pole}");
        assert!(!is_sea(equator));
        assert!(is_sea(pole));
    }
}
