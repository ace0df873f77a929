//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This HTTP surface is the presentation-layer consumer of `AuthContext`: it
//! exposes the read-only snapshot, gate decisions, and the `sign_out` /
//! `refresh_profile` / save actions. It never mutates auth state directly.

pub mod auth;
pub mod gate;
pub mod profile;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::auth::AuthError;
use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/state", get(auth::state))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/gate/{gate}", get(gate::decision))
        .route("/api/profile", put(profile::save))
        .route("/api/profile/refresh", post(profile::refresh))
        .route("/api/dev/sign-in", post(auth::dev_sign_in))
        .route("/api/dev/refresh", post(auth::dev_refresh))
        .route("/api/dev/update-user", post(auth::dev_update_user))
        .route("/api/dev/expire", post(auth::dev_expire))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        AuthError::Inactive => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Identity(_) | AuthError::Profile(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = auth_error_to_status(&self);
        let body = serde_json::json!({ "error": self.error_code(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
