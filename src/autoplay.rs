//! Greedy player used for headless runs: upgrade the castle whenever the
//! stored price is covered, otherwise buy the first purchasable tile.

use crate::catalog::Catalog;
use crate::engine::{Action, Engine, EngineError};
use crate::resources::can_afford;
use crate::state::GameState;

pub fn choose(state: &GameState, catalog: &Catalog) -> Option<Action> {
    if state.castle_level() < catalog.castle.max_level {
        if let Some(cost) = state.next_upgrade_cost() {
            if can_afford(&state.resources, cost) {
                return Some(Action::UpgradeCastle);
            }
        }
    }

    if !can_afford(&state.resources, catalog.tile_cost) {
        return None;
    }
    state
        .grid
        .purchasable_positions()
        .first()
        .map(|&(x, y)| Action::BuyTile { x, y })
}

/// Keep acting until nothing more is affordable. Returns the actions applied.
pub fn play(engine: &mut Engine) -> Result<Vec<Action>, EngineError> {
    let mut applied = Vec::new();
    while let Some(action) = choose(engine.state(), engine.catalog()) {
        if !engine.dispatch(action)? {
            break;
        }
        applied.push(action);
    }
    Ok(applied)
}
