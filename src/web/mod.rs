use std::{
    convert::Infallible,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    config::{Config, WorldConfig},
    faction::{found_faction, ClaimError, FoundFaction},
    materialize::{populate_world, Population},
    store::WorldStore,
    world::{Faction, FactionId, TileId, WorldEvent, WorldState},
};

const ADMIN_KEY_HEADER: &str = "x-admin-key";
const EVENT_BUFFER: usize = 512;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Box<dyn WorldStore>>>,
    broadcaster: broadcast::Sender<WorldEvent>,
    world: WorldConfig,
    batch_size: usize,
    admin_key: Option<String>,
}

impl AppState {
    pub fn new(store: Box<dyn WorldStore>, config: &Config) -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store: Arc::new(Mutex::new(store)),
            broadcaster: tx,
            world: config.world,
            batch_size: config.storage.batch_size,
            admin_key: config.server.admin_key.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.broadcaster.subscribe()
    }

    /// Push an event to every connected viewer. Having no viewers is fine.
    pub fn publish(&self, event: WorldEvent) {
        let _ = self.broadcaster.send(event);
    }

    /// Run `f` against the store on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn WorldStore) -> T + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = store.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut **guard)
        })
        .await
        .context("store task failed")
    }

    /// Generate the configured world unless one is already stored.
    pub async fn populate(&self) -> Result<Population> {
        let world = self.world;
        let batch_size = self.batch_size;
        let outcome = self
            .with_store(move |store| populate_world(store, &world, batch_size))
            .await??;
        Ok(outcome)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/debug/ping", get(ping))
        .route("/api/state", get(world_state))
        .route("/api/factions", get(factions))
        .route("/api/faction", post(create_faction))
        .route("/admin/reset-world", get(reset_world).post(reset_world))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(config: Config, store: Box<dyn WorldStore>) -> Result<()> {
    let state = Arc::new(AppState::new(store, &config));

    if config.populate_on_boot() {
        // A failed generation leaves the server up with whatever is stored.
        if let Err(err) = state.populate().await {
            tracing::error!(error = %err, "world initialisation failed");
        }
    }

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    tracing::info!(addr = %listener.local_addr()?, "territory server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}

pub struct ApiError {
    status: StatusCode,
    code: &'static str,
}

impl ApiError {
    fn internal(code: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!(code, error = %err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        let status = match err {
            ClaimError::TileNotFound(_) => StatusCode::NOT_FOUND,
            ClaimError::Store(_) => return ApiError::internal(err.code(), &err),
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            code: err.code(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.code })).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct Ping {
    ok: bool,
    ts: i64,
    version: &'static str,
}

async fn ping() -> Json<Ping> {
    Json(Ping {
        ok: true,
        ts: Utc::now().timestamp_millis(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn world_state(State(state): State<Arc<AppState>>) -> Result<Json<WorldState>, ApiError> {
    let loaded = state
        .with_store(|store| -> Result<WorldState, crate::store::StoreError> {
            Ok(WorldState::new(store.tiles()?, store.factions()?))
        })
        .await;
    match loaded {
        Ok(Ok(world)) => Ok(Json(world)),
        Ok(Err(err)) => Err(ApiError::internal("state_failed", err)),
        Err(err) => Err(ApiError::internal("state_failed", err)),
    }
}

async fn factions(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Faction>>, ApiError> {
    match state.with_store(|store| store.factions()).await {
        Ok(Ok(factions)) => Ok(Json(factions)),
        Ok(Err(err)) => Err(ApiError::internal("factions_failed", err)),
        Err(err) => Err(ApiError::internal("factions_failed", err)),
    }
}

#[derive(Debug, Serialize)]
struct UpdatedTile {
    id: TileId,
    owner_faction_id: Option<FactionId>,
    capture: u8,
}

#[derive(Debug, Serialize)]
struct FactionCreated {
    ok: bool,
    faction: Faction,
    updated_tile: UpdatedTile,
}

async fn create_faction(
    State(state): State<Arc<AppState>>,
    body: Option<Json<FoundFaction>>,
) -> Result<Json<FactionCreated>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let (faction, diff) = state
        .with_store(move |store| found_faction(store, request))
        .await
        .map_err(|err| ApiError::internal("create_failed", err))??;

    state.publish(WorldEvent::Update(vec![diff.clone()]));

    Ok(Json(FactionCreated {
        ok: true,
        faction,
        updated_tile: UpdatedTile {
            id: diff.tile_id,
            owner_faction_id: diff.owner_faction_id,
            capture: diff.capture,
        },
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ResetQuery {
    key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResetOutcome {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn admin_key_matches(expected: Option<&str>, query: &ResetQuery, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    let supplied = query.key.as_deref().or_else(|| {
        headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
    });
    supplied == Some(expected)
}

async fn reset_world(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetQuery>,
    headers: HeaderMap,
) -> Response {
    if !admin_key_matches(state.admin_key.as_deref(), &query, &headers) {
        return ApiError {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthorized",
        }
        .into_response();
    }

    let world = state.world;
    let batch_size = state.batch_size;
    let outcome = state
        .with_store(move |store| -> Result<Population> {
            store.reset()?;
            Ok(populate_world(store, &world, batch_size)?)
        })
        .await
        .and_then(|inner| inner);

    match outcome {
        Ok(population) => {
            tracing::info!(?population, "world reset");
            state.publish(WorldEvent::Reset);
            Json(ResetOutcome {
                ok: true,
                msg: Some("World reset and re-initialized".to_string()),
                error: None,
            })
            .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "world reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ResetOutcome {
                    ok: false,
                    msg: None,
                    error: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("viewer subscribed");
    let rx = state.subscribe();
    // Lagged receivers skip what they missed instead of stalling publishers.
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(event) => match event.payload() {
            Ok(data) => Some(Ok::<_, Infallible>(
                Event::default().event(event.name()).data(data),
            )),
            Err(_) => None,
        },
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
