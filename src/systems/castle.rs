use crate::catalog::Catalog;
use crate::rates::calculate_rates;
use crate::resources::can_afford;
use crate::state::GameState;

/// Raise the castle one level, paying the price stored on the castle tile.
///
/// The price and the current level are read from the same pre-mutation
/// tile before anything is written.
pub fn upgrade_castle(mut state: GameState, catalog: &Catalog) -> (GameState, bool) {
    let Some(castle) = state.grid.castle() else {
        return (state, false);
    };
    let (Some(level), Some(cost)) = (castle.level, castle.upgrade_cost.clone()) else {
        return (state, false);
    };
    if level >= catalog.castle.max_level {
        return (state, false);
    }
    if !can_afford(&state.resources, &cost) {
        return (state, false);
    }

    let next_level = level + 1;
    if let Some(castle) = state.grid.castle_mut() {
        castle.level = Some(next_level);
        castle.upgrade_cost = catalog.castle.upgrade_cost(next_level).cloned();
    }
    state.resources.subtract(&cost);
    state.rates = calculate_rates(&state.grid, catalog);
    state.progress.castle_upgrades += 1;
    (state, true)
}
