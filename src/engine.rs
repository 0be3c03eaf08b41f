use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::{ConfigError, GameConfig};
use crate::grid::GridError;
use crate::rates::calculate_rates;
use crate::rng::RngManager;
use crate::save::{SaveError, SaveStore};
use crate::state::{GameSnapshot, GameState};
use crate::systems;

const BIOME_STREAM: &str = "biomes";

/// Something the player or the driving timer asks the store to do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    BuyTile { x: u32, y: u32 },
    UpgradeCastle,
    Tick { delta_ms: f64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid grid: {0}")]
    Grid(#[from] GridError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

pub struct EngineBuilder {
    config: GameConfig,
    save_store: Option<SaveStore>,
    state: Option<GameState>,
}

impl EngineBuilder {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            save_store: None,
            state: None,
        }
    }

    pub fn with_save_store(mut self, store: SaveStore) -> Self {
        self.save_store = Some(store);
        self
    }

    /// Start from an existing state, e.g. one read from a save.
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let config = self.config;
        config.validate()?;

        let state = match self.state {
            Some(mut state) => {
                state.grid.validate(config.grid.width, config.grid.height)?;
                let rates = calculate_rates(&state.grid, &config.catalog);
                if rates != state.rates {
                    debug!("stored rates differ from grid, recomputed");
                    state.rates = rates;
                }
                state
            }
            None => GameState::new(
                config.grid.width,
                config.grid.height,
                config.starting_resources,
                &config.catalog,
            )?,
        };

        Ok(Engine {
            rng: RngManager::new(config.seed),
            save_store: self.save_store,
            ticks_since_save: 0,
            state,
            config,
        })
    }
}

/// The game store: owns the committed state and wraps the pure transitions
/// with randomness, persistence and logging.
#[derive(Debug)]
pub struct Engine {
    config: GameConfig,
    state: GameState,
    rng: RngManager,
    save_store: Option<SaveStore>,
    ticks_since_save: u64,
}

impl Engine {
    /// Resume the configured save, or start a fresh realm when there is none.
    pub fn load_or_new(config: GameConfig) -> Result<Self, EngineError> {
        let store = SaveStore::from_config(&config.save);
        let builder = match store.load()? {
            Some(file) => {
                info!(
                    "resuming '{}' saved at {} ({} tiles owned)",
                    config.name,
                    file.saved_at,
                    file.state.grid.owned_count()
                );
                EngineBuilder::new(config).with_state(file.state)
            }
            None => {
                info!("starting new realm '{}'", config.name);
                EngineBuilder::new(config)
            }
        };
        builder.with_save_store(store).build()
    }

    /// Start a fresh realm and overwrite the configured save without reading it.
    pub fn start_over(config: GameConfig) -> Result<Self, EngineError> {
        let store = SaveStore::from_config(&config.save);
        let mut engine = EngineBuilder::new(config).with_save_store(store).build()?;
        engine.reset()?;
        engine.save()?;
        Ok(engine)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.config.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.state.snapshot(&self.config.name, &self.config.catalog)
    }

    /// Unowned tiles bordering owned land, row-major.
    pub fn purchasable_tiles(&self) -> Vec<(u32, u32)> {
        self.state.grid.purchasable_positions()
    }

    /// Apply one action and commit the resulting state.
    ///
    /// Returns whether the action took effect; ticks always do. A persistence
    /// error is reported after the new state has been committed in memory.
    pub fn dispatch(&mut self, action: Action) -> Result<bool, EngineError> {
        let current = self.state.clone();
        let (next, applied) = match action {
            Action::BuyTile { x, y } => {
                let rng = self.rng.stream(BIOME_STREAM);
                systems::purchase_tile(current, &self.config.catalog, x, y, rng)
            }
            Action::UpgradeCastle => systems::upgrade_castle(current, &self.config.catalog),
            Action::Tick { delta_ms } => (systems::tick(current, delta_ms), true),
        };
        if !applied {
            debug!("{action:?} rejected");
            return Ok(false);
        }
        self.state = next;

        match action {
            Action::BuyTile { x, y } => {
                if let Some(tile) = self.state.grid.get(x, y) {
                    debug!(
                        "bought tile ({x}, {y}) as {:?}, gold now {:.1}",
                        tile.biome, self.state.resources.gold
                    );
                }
                self.save()?;
            }
            Action::UpgradeCastle => {
                info!(
                    "castle upgraded to level {}/{}",
                    self.state.castle_level(),
                    self.config.catalog.castle.max_level
                );
                self.save()?;
            }
            Action::Tick { .. } => {
                self.ticks_since_save += 1;
                let interval = self.config.save.interval_ticks;
                if interval > 0 && self.ticks_since_save >= interval {
                    self.save()?;
                }
            }
        }
        Ok(true)
    }

    pub fn buy_tile(&mut self, x: u32, y: u32) -> Result<bool, EngineError> {
        self.dispatch(Action::BuyTile { x, y })
    }

    pub fn upgrade_castle(&mut self) -> Result<bool, EngineError> {
        self.dispatch(Action::UpgradeCastle)
    }

    pub fn tick(&mut self, delta_ms: f64) -> Result<(), EngineError> {
        self.dispatch(Action::Tick { delta_ms }).map(|_| ())
    }

    /// Drive `ticks` ticks of the configured interval without waiting,
    /// calling `hook` after each commit.
    pub fn run_fixed<F>(&mut self, ticks: u64, mut hook: F) -> Result<(), EngineError>
    where
        F: FnMut(&mut Self),
    {
        let delta_ms = self.config.tick_interval_ms as f64;
        for _ in 0..ticks {
            self.tick(delta_ms)?;
            hook(self);
        }
        Ok(())
    }

    pub fn save(&mut self) -> Result<Option<PathBuf>, EngineError> {
        self.ticks_since_save = 0;
        let Some(store) = &self.save_store else {
            return Ok(None);
        };
        let path = store.write(&self.state)?;
        debug!("saved to {}", path.display());
        Ok(Some(path))
    }

    /// Throw away progress and start over, clearing the save.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.state = GameState::new(
            self.config.grid.width,
            self.config.grid.height,
            self.config.starting_resources,
            &self.config.catalog,
        )?;
        self.rng = RngManager::new(self.config.seed);
        self.ticks_since_save = 0;
        if let Some(store) = &self.save_store {
            if store.clear()? {
                warn!("cleared save {}", store.path().display());
            }
        }
        Ok(())
    }
}
