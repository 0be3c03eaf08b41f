//! HTTP adapter around the engine: a JSON API for the presentation layer, an
//! SSE stream of committed snapshots, and the fixed-interval tick driver.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Serialize;
use tokio::{
    net::TcpListener,
    sync::broadcast,
    time::{self, MissedTickBehavior},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    catalog::Catalog,
    engine::{Action, Engine, EngineError},
    state::GameSnapshot,
};

pub struct WebServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<Engine>>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        let (broadcaster, _) = broadcast::channel::<String>(256);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            broadcaster,
        }
    }

    fn engine(&self) -> Result<MutexGuard<'_, Engine>, ApiError> {
        self.engine.lock().map_err(|_| ApiError::Poisoned)
    }

    fn publish(&self, snapshot: &GameSnapshot) {
        if self.broadcaster.receiver_count() == 0 {
            return;
        }
        match serde_json::to_string(snapshot) {
            Ok(payload) => {
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!("failed to encode snapshot: {err}"),
        }
    }

    /// Apply an action and publish the committed snapshot.
    fn apply(&self, action: Action) -> Result<ActionResponse, ApiError> {
        let (applied, snapshot) = {
            let mut engine = self.engine()?;
            let applied = engine.dispatch(action)?;
            (applied, engine.snapshot())
        };
        if applied {
            self.publish(&snapshot);
        }
        Ok(ActionResponse { applied, snapshot })
    }
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub applied: bool,
    pub snapshot: GameSnapshot,
}

#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    Poisoned,
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        ApiError::Engine(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::Engine(err) => {
                error!("engine error: {err}");
                err.to_string()
            }
            ApiError::Poisoned => "engine lock poisoned".to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/catalog", get(catalog))
        .route("/api/tiles/:x/:y/buy", post(buy_tile))
        .route("/api/castle/upgrade", post(upgrade_castle))
        .route("/api/actions", post(dispatch_action))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(engine: Engine, config: WebServerConfig) -> Result<()> {
    let interval_ms = engine.config().tick_interval_ms;
    let name = engine.config().name.clone();
    let state = AppState::new(engine);

    let driver = tokio::spawn(drive_ticks(state.clone(), Duration::from_millis(interval_ms)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("realm '{name}' served at http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    driver.abort();
    let mut engine = state
        .engine
        .lock()
        .map_err(|_| anyhow::anyhow!("engine lock poisoned"))?;
    if let Some(path) = engine.save()? {
        info!("final save written to {}", path.display());
    }
    Ok(())
}

/// Tick on a fixed period, passing the measured elapsed time so late or
/// skipped timer firings still accrue the right amount.
async fn drive_ticks(state: AppState, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    loop {
        interval.tick().await;
        let now = Instant::now();
        let elapsed = now.duration_since(last);
        last = now;
        if let Err(err) = advance(&state, elapsed) {
            error!("tick failed: {err:?}");
        }
    }
}

fn advance(state: &AppState, elapsed: Duration) -> Result<(), ApiError> {
    let delta_ms = elapsed.as_secs_f64() * 1_000.0;
    state.apply(Action::Tick { delta_ms }).map(|_| ())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn latest_state(State(state): State<AppState>) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.engine()?.snapshot()))
}

async fn catalog(State(state): State<AppState>) -> Result<Json<Catalog>, ApiError> {
    Ok(Json(state.engine()?.catalog().clone()))
}

async fn buy_tile(
    State(state): State<AppState>,
    Path((x, y)): Path<(u32, u32)>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.apply(Action::BuyTile { x, y }).map(Json)
}

async fn upgrade_castle(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    state.apply(Action::UpgradeCastle).map(Json)
}

/// Accepts any tagged [`Action`], e.g. `{"type":"buy_tile","x":4,"y":3}`.
async fn dispatch_action(
    State(state): State<AppState>,
    Json(action): Json<Action>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.apply(action).map(Json)
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
