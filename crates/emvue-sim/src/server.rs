//! Simulator HTTP server.
//!
//! An axum router over [`SimulatorState`], serving the same endpoints the
//! cloud API exposes to the client. Authentication is not checked; the only
//! 401 the simulator produces is the upstream's own quirk of answering
//! unknown device gids on the location-properties endpoint with 401.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, RwLock};
use tracing::debug;

use crate::state::SimulatorState;

/// Shared handle to the simulator state.
pub type SharedState = Arc<RwLock<SimulatorState>>;

/// Build the simulator router over the given state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/customers", get(get_customer))
        .route("/customers/devices", get(get_devices))
        .route("/customers/devices/status", get(get_status))
        .route("/customers/vehicles", get(get_vehicles))
        .route(
            "/devices/{device_gid}/locationProperties",
            get(get_location_properties),
        )
        .route("/devices/channels/channeltypes", get(get_channel_types))
        .route("/devices/outlet", put(put_outlet))
        .route("/devices/evcharger", put(put_charger))
        .route("/AppAPI", get(app_api))
        .with_state(state)
}

async fn get_customer(State(state): State<SharedState>) -> Response {
    Json(state.read().await.customer().clone()).into_response()
}

async fn get_devices(State(state): State<SharedState>) -> Response {
    Json(state.read().await.devices_payload()).into_response()
}

async fn get_status(State(state): State<SharedState>) -> Response {
    Json(state.read().await.status()).into_response()
}

async fn get_vehicles() -> Response {
    Json(json!([])).into_response()
}

async fn get_channel_types(State(state): State<SharedState>) -> Response {
    Json(state.read().await.channel_types().to_vec()).into_response()
}

async fn get_location_properties(
    State(state): State<SharedState>,
    Path(device_gid): Path<i64>,
) -> Response {
    let state = state.read().await;
    match state.device(device_gid) {
        Some(device) => Json(device.location_properties.clone()).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": format!(
                    "{} is not authorized on the requested deviceGid {device_gid}",
                    state.customer().email
                )
            })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct AppApiQuery {
    #[serde(rename = "apiMethod")]
    api_method: String,
    #[serde(rename = "deviceGids", default)]
    device_gids: Option<String>,
    #[serde(default)]
    instant: Option<String>,
}

async fn app_api(
    State(state): State<SharedState>,
    Query(query): Query<AppApiQuery>,
) -> Response {
    debug!(method = %query.api_method, "AppAPI request");
    match query.api_method.as_str() {
        "getDeviceListUsages" => {
            let state = state.read().await;
            let payload = state.usage_payload(
                query.device_gids.as_deref().unwrap_or_default(),
                query.instant.as_deref(),
            );
            Json(payload).into_response()
        }
        // Chart history is not simulated; answer with an empty series.
        "getChartUsage" => Json(json!({
            "firstUsageInstant": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "usageList": [],
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Unknown API method"})),
        )
            .into_response(),
    }
}

async fn put_outlet(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let updated = state.write().await.update_outlet(&body);
    match updated {
        Some(outlet) => Json(outlet).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": format!("Outlet not found: {}", body.get("deviceGid").unwrap_or(&Value::Null))
            })),
        )
            .into_response(),
    }
}

async fn put_charger(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let updated = state.write().await.update_charger(&body);
    match updated {
        Some(charger) => Json(charger).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": format!("Charger not found: {}", body.get("deviceGid").unwrap_or(&Value::Null))
            })),
        )
            .into_response(),
    }
}

/// An in-process simulator that shuts down when dropped.
///
/// Binds an ephemeral loopback port, which keeps parallel test runs from
/// colliding.
pub struct SimulatorServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl SimulatorServer {
    /// Start a server over the given state.
    pub async fn start(state: SimulatorState) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = router(Arc::new(RwLock::new(state)));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// The server's base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shut down gracefully.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for SimulatorServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
