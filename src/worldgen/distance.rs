use std::collections::VecDeque;

use crate::spatial::{Field, TileGrid};

use super::GenerationError;

const UNREACHED: u32 = u32::MAX;

/// 4-neighbour distance from every cell to the nearest sea cell.
#[derive(Debug, Clone)]
pub struct CoastDistance {
    pub distance: Field<u32>,
    /// Largest distance over land cells; 0 when the world has no land.
    pub max_distance: u32,
}

impl CoastDistance {
    /// `distance / max_distance`, capped at 1. Sea and coast-adjacent land give 0.
    pub fn continentality(&self, distance: u32) -> f64 {
        if self.max_distance == 0 {
            return 0.0;
        }
        (distance as f64 / self.max_distance as f64).min(1.0)
    }
}

/// Multi-source breadth-first flood from all sea cells at once.
///
/// Every cell is queued at most once and keeps the depth at which it was first
/// reached. A mask without sea is rejected since continentality can't be
/// normalised.
pub fn distance_to_sea(sea: &Field<bool>) -> Result<CoastDistance, GenerationError> {
    let grid: TileGrid = sea.grid();
    let mut distance = Field::filled(grid, UNREACHED);
    let mut queue = VecDeque::new();

    for (i, &is_sea) in sea.as_slice().iter().enumerate() {
        if is_sea {
            distance.cells_mut()[i] = 0;
            queue.push_back(i);
        }
    }
    if queue.is_empty() {
        return Err(GenerationError::NoSea {
            width: grid.width(),
            height: grid.height(),
        });
    }

    while let Some(i) = queue.pop_front() {
        let next = distance.as_slice()[i] + 1;
        let Some(pos) = grid.pos(i) else { continue };
        for neighbor in grid.neighbors(pos) {
            let Some(ni) = grid.index(neighbor) else { continue };
            let cell = &mut distance.cells_mut()[ni];
            if *cell == UNREACHED {
                *cell = next;
                queue.push_back(ni);
            }
        }
    }

    let max_distance = distance
        .as_slice()
        .iter()
        .zip(sea.as_slice())
        .filter(|&(_, &is_sea)| !is_sea)
        .map(|(&d, _)| d)
        .max()
        .unwrap_or(0);
    debug_assert!(max_distance != UNREACHED, "grid is 4-connected");

    Ok(CoastDistance {
        distance,
        max_distance,
    })
}
