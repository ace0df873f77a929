//! Auth routes — snapshot, sign-out, and local-provider dev controls.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::auth::AuthError;
use crate::state::{AppState, CombinedState};

/// `GET /api/auth/state` — current combined snapshot.
pub async fn state(State(state): State<AppState>) -> Json<CombinedState> {
    Json(state.auth.snapshot())
}

/// `POST /api/auth/sign-out`
pub async fn sign_out(State(state): State<AppState>) -> Result<StatusCode, AuthError> {
    state.auth.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// DEV CONTROLS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DevSignIn {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// `POST /api/dev/sign-in` — push a sign-in through the local provider.
///
/// Enabled only when `AUTHGATE_DEV_ROUTES=true`.
pub async fn dev_sign_in(State(state): State<AppState>, Json(body): Json<DevSignIn>) -> Response {
    let Some(identity) = &state.local_identity else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let user_id = body.user_id.unwrap_or_else(Uuid::new_v4);
    let session = identity.sign_in(user_id, body.email, body.full_name);
    (StatusCode::CREATED, Json(session)).into_response()
}

/// `POST /api/dev/refresh` — push a token refresh.
pub async fn dev_refresh(State(state): State<AppState>) -> Response {
    let Some(identity) = &state.local_identity else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match identity.refresh_token() {
        Some(session) => Json(session).into_response(),
        None => AuthError::NotAuthenticated.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct DevUpdateUser {
    pub full_name: Option<String>,
}

/// `POST /api/dev/update-user` — push a user-metadata change.
pub async fn dev_update_user(State(state): State<AppState>, Json(body): Json<DevUpdateUser>) -> Response {
    let Some(identity) = &state.local_identity else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match identity.update_user(body.full_name) {
        Some(session) => Json(session).into_response(),
        None => AuthError::NotAuthenticated.into_response(),
    }
}

/// `POST /api/dev/expire` — push an expiry notification.
pub async fn dev_expire(State(state): State<AppState>) -> StatusCode {
    let Some(identity) = &state.local_identity else {
        return StatusCode::NOT_FOUND;
    };
    identity.expire();
    StatusCode::NO_CONTENT
}
