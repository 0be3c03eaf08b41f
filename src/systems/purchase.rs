use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::grid::Tile;
use crate::rates::calculate_rates;
use crate::resources::can_afford;
use crate::state::GameState;

/// Buy the tile at `(x, y)` for the catalog's flat gold price.
///
/// Fails without touching the state when the tile is owned, has no owned
/// neighbour, or gold falls short, checked in that order. Coordinates outside
/// the grid also fail. The new biome is drawn uniformly from the purchasable
/// biomes using `rng`.
pub fn purchase_tile<R: Rng + ?Sized>(
    mut state: GameState,
    catalog: &Catalog,
    x: u32,
    y: u32,
    rng: &mut R,
) -> (GameState, bool) {
    let Some(target) = state.grid.get(x, y) else {
        return (state, false);
    };
    if target.is_owned {
        return (state, false);
    }
    if !state.grid.is_adjacent_to_owned(x, y) {
        return (state, false);
    }
    if !can_afford(&state.resources, catalog.tile_cost) {
        return (state, false);
    }

    let biomes = catalog.purchasable_biomes();
    let Some(biome) = biomes.choose(rng).copied() else {
        return (state, false);
    };

    if let Some(tile) = state.grid.get_mut(x, y) {
        *tile = Tile::owned(biome);
    }
    state.resources.gold -= catalog.tile_cost;
    state.rates = calculate_rates(&state.grid, catalog);
    state.progress.tiles_purchased += 1;
    (state, true)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::catalog::{self, BiomeType};
    use crate::resources::ResourceBundle;

    fn state_with_gold(gold: f64) -> (GameState, Catalog) {
        let catalog = catalog::builtin();
        let resources = ResourceBundle {
            gold,
            ..ResourceBundle::default()
        };
        let state = GameState::new(5, 5, resources, &catalog).unwrap();
        (state, catalog)
    }

    #[test]
    fn buying_owned_tile_fails_unchanged() {
        let (state, catalog) = state_with_gold(1_000.0);
        let before = state.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (after, ok) = purchase_tile(state, &catalog, 2, 2, &mut rng);
        assert!(!ok);
        assert_eq!(after, before);
    }

    #[test]
    fn buying_non_adjacent_tile_fails_unchanged() {
        let (state, catalog) = state_with_gold(1_000.0);
        let before = state.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (after, ok) = purchase_tile(state, &catalog, 0, 0, &mut rng);
        assert!(!ok);
        assert_eq!(after, before);
    }

    #[test]
    fn buying_without_gold_fails_unchanged() {
        let (state, catalog) = state_with_gold(99.0);
        let before = state.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (after, ok) = purchase_tile(state, &catalog, 2, 1, &mut rng);
        assert!(!ok);
        assert_eq!(after, before);
    }

    #[test]
    fn out_of_bounds_fails_unchanged() {
        let (state, catalog) = state_with_gold(1_000.0);
        let before = state.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (after, ok) = purchase_tile(state, &catalog, 5, 2, &mut rng);
        assert!(!ok);
        assert_eq!(after, before);
    }

    #[test]
    fn successful_purchase_deducts_cost_and_recomputes_rates() {
        let (state, catalog) = state_with_gold(250.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (after, ok) = purchase_tile(state, &catalog, 2, 1, &mut rng);
        assert!(ok);
        assert_eq!(after.resources.gold, 150.0);
        assert_eq!(after.grid.owned_count(), 2);
        let tile = after.grid.get(2, 1).unwrap();
        assert!(tile.is_owned);
        assert!(tile.biome.is_purchasable());
        assert_eq!(tile.level, None);
        assert_eq!(tile.upgrade_cost, None);
        assert_eq!(after.rates, calculate_rates(&after.grid, &catalog));
        assert_eq!(after.progress.tiles_purchased, 1);
    }

    #[test]
    fn single_biome_catalog_gives_exact_outcome() {
        let (state, mut catalog) = state_with_gold(100.0);
        catalog
            .biomes
            .retain(|def| !def.biome.is_purchasable() || def.biome == BiomeType::Quarry);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (after, ok) = purchase_tile(state, &catalog, 1, 2, &mut rng);
        assert!(ok);
        assert_eq!(after.grid.get(1, 2).unwrap().biome, BiomeType::Quarry);
        assert_eq!(after.resources.gold, 0.0);
        assert!((after.rates.modifiers.stone - 1.15).abs() < 1e-12);
    }

    #[test]
    fn same_seed_rolls_same_biome() {
        let (state, catalog) = state_with_gold(1_000.0);
        let (a, _) = purchase_tile(
            state.clone(),
            &catalog,
            3,
            2,
            &mut ChaCha8Rng::seed_from_u64(11),
        );
        let (b, _) = purchase_tile(state, &catalog, 3, 2, &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
