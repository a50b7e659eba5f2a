//! Route handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::json;

use crate::error::Result;
use crate::hub::Hub;
use crate::keepalive::supervise;
use crate::server::auth::{require_basic_auth, Credentials};
use crate::stats::HubStats;
use crate::telemetry::Event;
use crate::transport::websocket::{self, WsSink};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Fan-out hub
    pub hub: Arc<Hub<WsSink>>,
    /// Inbound WebSocket message cap
    pub max_message_size: usize,
}

/// Build the relay router
///
/// With `credentials` set, every route except `/ws` requires Basic auth.
pub fn router(state: AppState, credentials: Option<Credentials>) -> Router {
    let producer = Router::new()
        .route("/webhook", post(ingest))
        .route("/api/reset", post(reset))
        .route("/api/stats", get(stats));

    let producer = match credentials {
        Some(credentials) => producer.route_layer(middleware::from_fn_with_state(
            Arc::new(credentials),
            require_basic_auth,
        )),
        None => producer,
    };

    Router::new()
        .route("/ws", get(subscribe))
        .merge(producer)
        .with_state(state)
}

async fn ingest(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Event>, JsonRejection>,
) -> Result<Response> {
    let Json(event) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected webhook payload");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response());
        }
    };

    state.hub.publish(event).await?;

    Ok(Json(json!({ "status": "received" })).into_response())
}

async fn reset(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.hub.reset().await?;

    Ok(Json(json!({ "status": "Data reset successfully" })))
}

async fn stats(State(state): State<AppState>) -> Json<HubStats> {
    Json(state.hub.stats().await)
}

async fn subscribe(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket: WebSocket| async move {
            let (sink, inbound) = websocket::split(socket);
            let subscriber = state.hub.admit(sink).await;
            supervise(Arc::clone(&state.hub), subscriber, inbound).await;
        })
}
