//! Grid geometry shared by world generation and storage

use serde::{Deserialize, Serialize};

/// Cell position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

/// Dimensions of a rectangular world, indexed row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn pos(&self, index: usize) -> Option<TilePos> {
        if index < self.cell_count() {
            Some(TilePos {
                x: (index % self.width as usize) as u32,
                y: (index / self.width as usize) as u32,
            })
        } else {
            None
        }
    }

    /// Row-major walk over every cell
    pub fn positions(&self) -> impl Iterator<Item = TilePos> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| TilePos { x, y }))
    }

    /// Neighbouring cells (4-connectivity). The border is a wall, never wrapped.
    pub fn neighbors(&self, pos: TilePos) -> impl Iterator<Item = TilePos> {
        let TilePos { x, y } = pos;
        let north = (y > 0).then(|| TilePos { x, y: y - 1 });
        let south = (y + 1 < self.height).then(|| TilePos { x, y: y + 1 });
        let west = (x > 0).then(|| TilePos { x: x - 1, y });
        let east = (x + 1 < self.width).then(|| TilePos { x: x + 1, y });

        [north, south, west, east].into_iter().flatten()
    }

    /// Distance from the equator row: 0 on the middle row, 1 on the top and bottom rows
    pub fn latitude(&self, y: u32) -> f64 {
        if self.height <= 1 {
            return 0.0;
        }
        let t = y as f64 / (self.height - 1) as f64;
        ((t - 0.5).abs() * 2.0).min(1.0)
    }

    /// Manhattan distance between two positions
    pub fn distance(&self, a: TilePos, b: TilePos) -> u32 {
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
    }
}

/// Dense per-cell values laid out row-major over a [`TileGrid`]
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    grid: TileGrid,
    cells: Vec<T>,
}

impl<T: Clone> Field<T> {
    pub fn filled(grid: TileGrid, value: T) -> Self {
        Self {
            grid,
            cells: vec![value; grid.cell_count()],
        }
    }
}

impl<T> Field<T> {
    /// Build a field by evaluating `f` at every cell in row-major order.
    pub fn from_fn(grid: TileGrid, mut f: impl FnMut(TilePos) -> T) -> Self {
        let cells = grid.positions().map(&mut f).collect();
        Self { grid, cells }
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn get(&self, pos: TilePos) -> Option<&T> {
        self.grid.index(pos).map(|i| &self.cells[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }
}

impl<T> std::ops::Index<TilePos> for Field<T> {
    type Output = T;

    fn index(&self, pos: TilePos) -> &T {
        let i = self
            .grid
            .index(pos)
            .unwrap_or_else(|| panic!("{pos:?} outside {:?}", self.grid));
        &self.cells[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_grid() {
        let grid = TileGrid::new(10, 5);

        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.cell_count(), 50);
    }

    #[test]
    fn test_pos_index_conversion() {
        let grid = TileGrid::new(10, 5);

        let pos = TilePos { x: 3, y: 2 };
        let index = grid.index(pos).unwrap();
        assert_eq!(index, 23); // 2 * 10 + 3

        assert_eq!(grid.pos(index), Some(pos));
        assert_eq!(grid.index(TilePos { x: 10, y: 0 }), None);
        assert_eq!(grid.pos(50), None);
    }

    #[test]
    fn test_positions_are_row_major() {
        let grid = TileGrid::new(3, 2);
        let walked: Vec<_> = grid.positions().map(|p| (p.x, p.y)).collect();
        assert_eq!(walked, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_neighbors() {
        let grid = TileGrid::new(10, 5);

        // Corner tile
        let pos = TilePos { x: 0, y: 0 };
        assert_eq!(grid.neighbors(pos).count(), 2); // Only south and east

        // Opposite corner
        let pos = TilePos { x: 9, y: 4 };
        assert_eq!(grid.neighbors(pos).count(), 2);

        // Middle tile
        let pos = TilePos { x: 5, y: 2 };
        assert_eq!(grid.neighbors(pos).count(), 4); // All directions

        // North, south, west, east
        let around: Vec<_> = grid.neighbors(pos).map(|p| (p.x, p.y)).collect();
        assert_eq!(around, vec![(5, 1), (5, 3), (4, 2), (6, 2)]);

        // Single cell
        let single = TileGrid::new(1, 1);
        assert_eq!(single.neighbors(TilePos { x: 0, y: 0 }).count(), 0);
    }

    #[test]
    fn test_latitude() {
        let grid = TileGrid::new(4, 5);
        assert_eq!(grid.latitude(0), 1.0);
        assert_eq!(grid.latitude(2), 0.0);
        assert_eq!(grid.latitude(4), 1.0);
        assert!((grid.latitude(1) - 0.5).abs() < 1e-12);

        // A single-row world is all equator
        assert_eq!(TileGrid::new(4, 1).latitude(0), 0.0);
    }

    #[test]
    fn test_distance() {
        let grid = TileGrid::new(10, 5);

        let a = TilePos { x: 0, y: 0 };
        let b = TilePos { x: 3, y: 4 };

        assert_eq!(grid.distance(a, b), 7); // 3 + 4
    }

    #[test]
    fn test_field_lookup() {
        let grid = TileGrid::new(3, 2);
        let field = Field::from_fn(grid, |p| p.x + 10 * p.y);
        assert_eq!(field[TilePos { x: 2, y: 1 }], 12);
        assert_eq!(field.get(TilePos { x: 3, y: 0 }), None);
        assert_eq!(field.as_slice(), &[0, 1, 2, 10, 11, 12]);

        let blank = Field::filled(grid, false);
        assert!(blank.as_slice().iter().all(|&v| !v));
    }
}
