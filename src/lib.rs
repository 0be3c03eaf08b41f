pub mod autoplay;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod grid;
pub mod rates;
pub mod resources;
pub mod rng;
pub mod save;
pub mod state;
pub mod systems;
pub mod web;

pub use config::GameConfig;
pub use engine::{Action, Engine, EngineBuilder, EngineError};
pub use state::{GameSnapshot, GameState};
