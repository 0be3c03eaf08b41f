use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::grid::{Grid, GridError, Tile};
use crate::rates::{calculate_rates, ResourceRates};
use crate::resources::{ResourceBundle, ResourceCost};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub tiles_purchased: u32,
    pub castle_upgrades: u32,
    pub ticks: u64,
    pub elapsed_ms: f64,
}

/// Everything a save holds. Transitions consume one and return the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub grid: Grid,
    pub resources: ResourceBundle,
    pub rates: ResourceRates,
    #[serde(default)]
    pub progress: Progress,
}

impl GameState {
    pub fn new(
        width: u32,
        height: u32,
        starting_resources: ResourceBundle,
        catalog: &Catalog,
    ) -> Result<Self, GridError> {
        let grid = Grid::new_with_castle(width, height, &catalog.castle)?;
        let rates = calculate_rates(&grid, catalog);
        Ok(Self {
            grid,
            resources: starting_resources,
            rates,
            progress: Progress::default(),
        })
    }

    pub fn castle(&self) -> Option<&Tile> {
        self.grid.castle()
    }

    pub fn castle_level(&self) -> u32 {
        self.castle().and_then(|tile| tile.level).unwrap_or(1)
    }

    pub fn next_upgrade_cost(&self) -> Option<&ResourceCost> {
        self.castle().and_then(|tile| tile.upgrade_cost.as_ref())
    }

    pub fn snapshot(&self, name: &str, catalog: &Catalog) -> GameSnapshot {
        GameSnapshot {
            name: name.to_string(),
            grid: self.grid.clone(),
            resources: self.resources,
            rates: self.rates,
            castle_level: self.castle_level(),
            castle_max_level: catalog.castle.max_level,
            next_upgrade_cost: self.next_upgrade_cost().cloned(),
            tile_cost: catalog.tile_cost,
            purchasable: self.grid.purchasable_positions(),
            progress: self.progress,
        }
    }
}

/// Read model handed to presentation layers after each commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub name: String,
    pub grid: Grid,
    pub resources: ResourceBundle,
    pub rates: ResourceRates,
    pub castle_level: u32,
    pub castle_max_level: u32,
    pub next_upgrade_cost: Option<ResourceCost>,
    pub tile_cost: f64,
    pub purchasable: Vec<(u32, u32)>,
    pub progress: Progress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn new_state_starts_with_consistent_rates() {
        let catalog = catalog::builtin();
        let state = GameState::new(9, 9, ResourceBundle::default(), &catalog).unwrap();
        assert_eq!(state.rates, calculate_rates(&state.grid, &catalog));
        assert_eq!(state.castle_level(), 1);
        assert_eq!(state.progress, Progress::default());
    }

    #[test]
    fn snapshot_lists_purchasable_tiles() {
        let catalog = catalog::builtin();
        let state = GameState::new(3, 3, ResourceBundle::default(), &catalog).unwrap();
        let snapshot = state.snapshot("test", &catalog);
        assert_eq!(snapshot.purchasable.len(), 4);
        assert_eq!(snapshot.castle_max_level, catalog.castle.max_level);
        assert_eq!(snapshot.next_upgrade_cost.as_ref(), catalog.castle.upgrade_cost(1));
    }
}
