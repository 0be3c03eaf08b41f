use crate::state::GameState;

/// Accrue `rates.total` for `delta_ms` of elapsed time. No clamping or cap.
pub fn tick(mut state: GameState, delta_ms: f64) -> GameState {
    let seconds = delta_ms / 1_000.0;
    let total = state.rates.total;
    state.resources.add_scaled(&total, seconds);
    state.progress.ticks += 1;
    state.progress.elapsed_ms += delta_ms;
    state
}
