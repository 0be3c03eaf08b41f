use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{BiomeType, CastleDef};
use crate::resources::ResourceCost;

/// Largest grid, in tiles, a realm may use.
pub const MAX_TILES: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub biome: BiomeType,
    pub is_owned: bool,
    /// Only the castle carries a level and an upgrade price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_cost: Option<ResourceCost>,
}

impl Tile {
    pub fn empty() -> Self {
        Self {
            biome: BiomeType::Empty,
            is_owned: false,
            level: None,
            upgrade_cost: None,
        }
    }

    pub fn castle(castle: &CastleDef) -> Self {
        Self {
            biome: BiomeType::Castle,
            is_owned: true,
            level: Some(1),
            upgrade_cost: castle.upgrade_cost(1).cloned(),
        }
    }

    pub fn owned(biome: BiomeType) -> Self {
        Self {
            biome,
            is_owned: true,
            level: None,
            upgrade_cost: None,
        }
    }

    pub fn is_castle(&self) -> bool {
        self.biome == BiomeType::Castle
    }
}

/// Fixed-size, row-major tile grid with the castle at the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("grid {width}x{height} exceeds the {max} tile limit")]
    TooLarge { width: u32, height: u32, max: usize },
    #[error("grid is {found_width}x{found_height}, expected {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },
    #[error("grid holds {found} tiles, expected {expected}")]
    TileCount { expected: usize, found: usize },
    #[error("expected exactly one castle, found {0}")]
    CastleCount(usize),
    #[error("castle must sit at ({x}, {y})")]
    CastleMisplaced { x: u32, y: u32 },
    #[error("castle tile must be owned and have a level")]
    CastleState,
}

impl Grid {
    pub fn new_with_castle(width: u32, height: u32, castle: &CastleDef) -> Result<Self, GridError> {
        let len = tile_count(width, height)?;
        let mut tiles = vec![Tile::empty(); len];
        let (cx, cy) = (width / 2, height / 2);
        tiles[(cy * width + cx) as usize] = Tile::castle(castle);
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn castle_position(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&Tile> {
        self.index(x, y).map(|idx| &self.tiles[idx])
    }

    pub(crate) fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        self.index(x, y).map(move |idx| &mut self.tiles[idx])
    }

    pub fn castle(&self) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.is_castle())
    }

    pub(crate) fn castle_mut(&mut self) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| tile.is_castle())
    }

    /// All tiles with their coordinates, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, &Tile)> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(idx, tile)| (idx as u32 % width, idx as u32 / width, tile))
    }

    pub fn owned_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().filter(|tile| tile.is_owned)
    }

    pub fn owned_count(&self) -> usize {
        self.owned_tiles().count()
    }

    /// True when an up/down/left/right neighbour is inside the grid and owned.
    pub fn is_adjacent_to_owned(&self, x: u32, y: u32) -> bool {
        const DIRS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        DIRS.iter().any(|(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx > u32::MAX as i64 || ny > u32::MAX as i64 {
                return false;
            }
            self.get(nx as u32, ny as u32)
                .map(|tile| tile.is_owned)
                .unwrap_or(false)
        })
    }

    /// Unowned tiles that border the owned territory, row-major.
    pub fn purchasable_positions(&self) -> Vec<(u32, u32)> {
        self.tiles()
            .filter(|(x, y, tile)| !tile.is_owned && self.is_adjacent_to_owned(*x, *y))
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    pub fn validate(&self, width: u32, height: u32) -> Result<(), GridError> {
        if self.width != width || self.height != height {
            return Err(GridError::DimensionMismatch {
                width,
                height,
                found_width: self.width,
                found_height: self.height,
            });
        }
        let expected = tile_count(width, height)?;
        if self.tiles.len() != expected {
            return Err(GridError::TileCount {
                expected,
                found: self.tiles.len(),
            });
        }
        let castles = self.tiles.iter().filter(|tile| tile.is_castle()).count();
        if castles != 1 {
            return Err(GridError::CastleCount(castles));
        }
        let (cx, cy) = self.castle_position();
        let castle = match self.get(cx, cy) {
            Some(tile) if tile.is_castle() => tile,
            _ => return Err(GridError::CastleMisplaced { x: cx, y: cy }),
        };
        if !castle.is_owned || castle.level.is_none() {
            return Err(GridError::CastleState);
        }
        Ok(())
    }
}

/// Number of tiles in a `width` by `height` grid, within [`MAX_TILES`].
pub fn tile_count(width: u32, height: u32) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::EmptyDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .filter(|count| *count <= MAX_TILES)
        .ok_or(GridError::TooLarge {
            width,
            height,
            max: MAX_TILES,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn grid(width: u32, height: u32) -> Grid {
        Grid::new_with_castle(width, height, &catalog::builtin().castle).unwrap()
    }

    #[test]
    fn new_grid_has_single_owned_castle_at_center() {
        let grid = grid(9, 7);
        assert_eq!(grid.castle_position(), (4, 3));
        let castle = grid.get(4, 3).unwrap();
        assert!(castle.is_castle());
        assert!(castle.is_owned);
        assert_eq!(castle.level, Some(1));
        assert!(castle.upgrade_cost.is_some());
        assert_eq!(grid.owned_count(), 1);
        assert_eq!(grid.validate(9, 7), Ok(()));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let err = Grid::new_with_castle(0, 5, &catalog::builtin().castle).unwrap_err();
        assert_eq!(err, GridError::EmptyDimensions { width: 0, height: 5 });
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let castle = catalog::builtin().castle;
        assert!(matches!(
            Grid::new_with_castle(65_536, 65_536, &castle),
            Err(GridError::TooLarge { width: 65_536, height: 65_536, .. })
        ));
        assert!(matches!(
            Grid::new_with_castle(u32::MAX, 2, &castle),
            Err(GridError::TooLarge { .. })
        ));
        assert!(Grid::new_with_castle(256, 256, &castle).is_ok());
        assert!(matches!(
            Grid::new_with_castle(256, 257, &castle),
            Err(GridError::TooLarge { .. })
        ));
    }

    #[test]
    fn adjacency_is_four_directional() {
        let grid = grid(5, 5);
        assert!(grid.is_adjacent_to_owned(2, 1));
        assert!(grid.is_adjacent_to_owned(2, 3));
        assert!(grid.is_adjacent_to_owned(1, 2));
        assert!(grid.is_adjacent_to_owned(3, 2));
        assert!(!grid.is_adjacent_to_owned(1, 1));
        assert!(!grid.is_adjacent_to_owned(3, 3));
        assert!(!grid.is_adjacent_to_owned(0, 0));
    }

    #[test]
    fn adjacency_ignores_out_of_bounds_neighbours() {
        let mut grid = grid(3, 3);
        *grid.get_mut(0, 0).unwrap() = Tile::owned(BiomeType::Forest);
        assert!(grid.is_adjacent_to_owned(1, 0));
        assert!(grid.is_adjacent_to_owned(0, 1));
        assert!(!grid.is_adjacent_to_owned(2, 2));
    }

    #[test]
    fn purchasable_positions_ring_the_castle() {
        let grid = grid(5, 5);
        assert_eq!(
            grid.purchasable_positions(),
            vec![(2, 1), (1, 2), (3, 2), (2, 3)]
        );
    }

    #[test]
    fn validate_catches_dimension_mismatch_and_missing_castle() {
        let mut grid = grid(5, 5);
        assert!(matches!(
            grid.validate(7, 7),
            Err(GridError::DimensionMismatch { .. })
        ));
        *grid.get_mut(2, 2).unwrap() = Tile::owned(BiomeType::Plains);
        assert_eq!(grid.validate(5, 5), Err(GridError::CastleCount(0)));
    }

    #[test]
    fn validate_catches_misplaced_castle() {
        let mut grid = grid(5, 5);
        let castle = grid.get(2, 2).cloned().unwrap();
        *grid.get_mut(2, 2).unwrap() = Tile::owned(BiomeType::Plains);
        *grid.get_mut(0, 0).unwrap() = castle;
        assert_eq!(
            grid.validate(5, 5),
            Err(GridError::CastleMisplaced { x: 2, y: 2 })
        );
    }
}
