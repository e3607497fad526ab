//! HTTP API handlers
//!
//! Every route accepts GET and POST so the dashboard can trigger them from
//! plain links as well as from scripts.

use crate::control::{KioskControl, ReloadOutcome};
use crate::device::DeviceProperties;
use crate::playlist::{PlayItem, PlayOutcome, PlaybackStatus};
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub control: Arc<KioskControl>,
    pub device: Arc<DeviceProperties>,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl AppState {
    pub fn new(control: Arc<KioskControl>, device: Arc<DeviceProperties>) -> Self {
        Self {
            control,
            device,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

/// Identity block of the status response
#[derive(Serialize)]
pub struct DeviceIdentity {
    pub uuid: String,
    pub logical_name: String,
    pub host_name: String,
    pub ip_address: String,
    pub dashboard_site: String,
}

/// General status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub device: DeviceIdentity,
    pub playback: PlaybackStatus,
}

/// Build the control router with its middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello_handler).post(hello_handler))
        .route("/status", get(status_handler).post(status_handler))
        .route("/playlist", get(playlist_handler).post(playlist_handler))
        // Playback control
        .route("/play", get(play_handler).post(play_handler))
        .route("/stop", get(stop_handler).post(stop_handler))
        .route("/reload", get(reload_handler).post(reload_handler))
        // Display shortcuts
        .route("/home", get(home_handler).post(home_handler))
        .route("/refresh", get(refresh_handler).post(refresh_handler))
        .fallback(fallback_handler)
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - liveness
pub async fn hello_handler() -> &'static str {
    "Hello world!"
}

/// GET /status - service, device and playback status
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let device = &state.device;
    Json(StatusResponse {
        service: "kiosk-control",
        version: env!("KIOSK_VERSION"),
        git_sha: env!("KIOSK_GIT_SHA"),
        started_at: state.started_at,
        uptime_secs: state.started.elapsed().as_secs(),
        device: DeviceIdentity {
            uuid: device.uuid.clone(),
            logical_name: device.logical_name.clone(),
            host_name: device.host_name.clone(),
            ip_address: device.ip_address.clone(),
            dashboard_site: device.dashboard_site.clone(),
        },
        playback: state.control.on_status(),
    })
}

/// GET /playlist - current playlist
pub async fn playlist_handler(State(state): State<AppState>) -> Json<Vec<PlayItem>> {
    Json(state.control.playlist())
}

/// POST /play - start playback from the current position
pub async fn play_handler(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.control.on_play();
    let status = match outcome {
        PlayOutcome::Started | PlayOutcome::AlreadyRunning => StatusCode::OK,
        PlayOutcome::EmptyPlaylist => StatusCode::CONFLICT,
    };
    (status, outcome.to_string())
}

/// POST /stop - stop at the next tick
pub async fn stop_handler(State(state): State<AppState>) -> &'static str {
    state.control.on_stop();
    "stopped"
}

/// POST /reload - refetch the playlist and restart playback
pub async fn reload_handler(State(state): State<AppState>) -> Json<ReloadOutcome> {
    Json(state.control.on_reload().await)
}

/// POST /home - stop and show the display's home page
pub async fn home_handler(State(state): State<AppState>) -> &'static str {
    state.control.on_home().await;
    "ok"
}

/// POST /refresh - reload the page currently on the display
pub async fn refresh_handler(State(state): State<AppState>) -> &'static str {
    state.control.on_refresh().await;
    "ok"
}

pub async fn fallback_handler(uri: Uri) -> String {
    format!("My server: {}", uri)
}
