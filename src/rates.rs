use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::grid::Grid;
use crate::resources::ResourceBundle;

/// Per-second production, split into what is generated and what multiplies it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRates {
    pub base: ResourceBundle,
    pub modifiers: ResourceBundle,
    pub total: ResourceBundle,
}

impl Default for ResourceRates {
    fn default() -> Self {
        Self {
            base: ResourceBundle::default(),
            modifiers: ResourceBundle::splat(1.0),
            total: ResourceBundle::default(),
        }
    }
}

/// Derive production from scratch for the given grid.
///
/// Modifiers compound multiplicatively across every owned tile.
pub fn calculate_rates(grid: &Grid, catalog: &Catalog) -> ResourceRates {
    let mut base = catalog.base_rates;

    if let Some(castle) = grid.castle() {
        let level = castle.level.unwrap_or(1);
        base.add_scaled(&catalog.castle.base_rates, catalog.castle.level_scale(level));
    }

    let mut modifiers = ResourceBundle::splat(1.0);
    for tile in grid.owned_tiles() {
        let Some(def) = catalog.biome(tile.biome) else {
            continue;
        };
        for (kind, factor) in &def.modifiers {
            *modifiers.get_mut(*kind) *= factor;
        }
    }

    ResourceRates {
        base,
        modifiers,
        total: base.scaled_by(&modifiers),
    }
}
