use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::classify::Classification;
use crate::scanner::ScanState;

#[derive(Clone)]
pub struct AppState {
    pub scans: Arc<HashMap<String, Arc<RwLock<ScanState>>>>,
}

impl AppState {
    pub fn new(scans: HashMap<String, Arc<RwLock<ScanState>>>) -> Self {
        Self {
            scans: Arc::new(scans),
        }
    }
}

#[derive(Serialize)]
struct DriftResponse {
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct StatusResponse {
    frames_processed: u64,
    stable: bool,
    drift: Option<DriftResponse>,
}

#[derive(Serialize)]
struct ClassificationResponse {
    summary: String,
    results: Vec<Classification>,
}

pub async fn start_server(state: AppState, port: u16) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/api/cameras", get(cameras_handler))
        .route("/api/cameras/{id}/status", get(status_handler))
        .route(
            "/api/cameras/{id}/classification",
            get(classification_handler),
        )
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn cameras_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cameras: Vec<String> = state.scans.keys().cloned().collect();
    axum::Json(cameras)
}

async fn status_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let scan = match state.scans.get(&id) {
        Some(s) => s,
        None => return (StatusCode::NOT_FOUND, "camera not found").into_response(),
    };

    let scan = match scan.read() {
        Ok(s) => s,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "scan state lock error").into_response()
        }
    };

    let response = StatusResponse {
        frames_processed: scan.frames_processed,
        stable: scan.stable,
        drift: scan.drift.map(|(x, y)| DriftResponse { x, y }),
    };

    axum::Json(response).into_response()
}

async fn classification_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let scan = match state.scans.get(&id) {
        Some(s) => s,
        None => return (StatusCode::NOT_FOUND, "camera not found").into_response(),
    };

    let scan = match scan.read() {
        Ok(s) => s,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "scan state lock error").into_response()
        }
    };

    let Some(summary) = scan.summary.clone() else {
        return (StatusCode::NOT_FOUND, "no classification yet").into_response();
    };

    let response = ClassificationResponse {
        summary,
        results: scan.latest.clone(),
    };

    axum::Json(response).into_response()
}
