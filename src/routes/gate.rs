//! Gate routes — route decisions for layout wrappers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::gate::{Gate, GateStage, RouteDecision};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GateResponse {
    pub gate: Gate,
    #[serde(flatten)]
    pub decision: RouteDecision,
    pub stage: Option<GateStage>,
}

/// `GET /api/gate/:gate` — decision for `protected`, `entry`, or `onboarding`.
pub async fn decision(State(state): State<AppState>, Path(gate): Path<String>) -> Response {
    let gate = match gate.parse::<Gate>() {
        Ok(gate) => gate,
        Err(e) => {
            let body = serde_json::json!({ "error": "E_UNKNOWN_GATE", "message": e.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };
    let snapshot = state.auth.snapshot();
    Json(GateResponse { gate, decision: gate.decide(&snapshot), stage: GateStage::classify(&snapshot) }).into_response()
}
