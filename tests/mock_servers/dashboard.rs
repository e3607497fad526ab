#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Mock dashboard web service for testing
//!
//! Simulates `POST /devices` (enrolment) and `GET /playlists/{id}.json`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Mock dashboard state
#[derive(Default)]
struct MockDashboardState {
    /// Playlist assigned to every enrolled device
    assigned_playlist: Option<i64>,
    /// Playlist payloads by id
    playlists: HashMap<i64, Value>,
    /// Enrolment bodies received
    enrolments: Vec<Value>,
    /// Status returned by the enrolment endpoint when set
    enrol_failure: Option<u16>,
}

/// Mock dashboard server
pub struct MockDashboard {
    addr: SocketAddr,
    state: Arc<RwLock<MockDashboardState>>,
    handle: JoinHandle<()>,
}

impl MockDashboard {
    /// Start a mock dashboard on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockDashboardState::default()));

        let app = Router::new()
            .route("/devices", post(handle_enrol))
            .route("/playlists/{file}", get(handle_playlist))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Site URL as stored in the device properties
    pub fn site(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Publish a playlist and assign it to enrolling devices.
    ///
    /// `items` are `(order, cmd, url, value)` tuples.
    pub async fn assign_playlist(&self, id: i64, items: &[(i64, i64, &str, i64)]) {
        let playitems: Vec<Value> = items
            .iter()
            .enumerate()
            .map(|(i, (order, cmd, url, value))| {
                json!({
                    "id": i as i64 + 1,
                    "order": order,
                    "cmd": cmd,
                    "value": value,
                    "page": {"id": i as i64 + 100, "url": url, "note": "", "portrait": false}
                })
            })
            .collect();

        let mut state = self.state.write().await;
        state.assigned_playlist = Some(id);
        state.playlists.insert(
            id,
            json!({"id": id, "name": format!("playlist {}", id), "note": "", "playitems": playitems}),
        );
    }

    /// Publish `payload` verbatim as playlist `id` and assign it
    pub async fn assign_raw_playlist(&self, id: i64, payload: Value) {
        let mut state = self.state.write().await;
        state.assigned_playlist = Some(id);
        state.playlists.insert(id, payload);
    }

    /// Make enrolment answer with `status`
    pub async fn fail_enrolment(&self, status: u16) {
        self.state.write().await.enrol_failure = Some(status);
    }

    /// Enrolment bodies received so far
    pub async fn enrolments(&self) -> Vec<Value> {
        self.state.read().await.enrolments.clone()
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn handle_enrol(
    State(state): State<Arc<RwLock<MockDashboardState>>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let mut state = state.write().await;
    state.enrolments.push(body.clone());

    if let Some(status) = state.enrol_failure {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({"error": "enrolment refused"}))).into_response();
    }

    let playlist = state
        .assigned_playlist
        .map(|id| json!({"id": id, "name": format!("playlist {}", id)}));
    Json(json!({
        "id": 42,
        "name": body["name"],
        "ip": body["ip"],
        "uuid": body["uuid"],
        "place": {"id": 1, "name": "lobby", "geoloc": ""},
        "playlist": playlist,
    }))
    .into_response()
}

async fn handle_playlist(
    State(state): State<Arc<RwLock<MockDashboardState>>>,
    Path(file): Path<String>,
) -> impl IntoResponse {
    let state = state.read().await;
    let playlist = file
        .strip_suffix(".json")
        .and_then(|id| id.parse::<i64>().ok())
        .and_then(|id| state.playlists.get(&id).cloned());

    match playlist {
        Some(playlist) => Json(playlist).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
