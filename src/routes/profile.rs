//! Profile routes — explicit save and refresh actions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::services::auth::AuthError;
use crate::state::{AppState, Profile, ProfileUpdate};

/// `PUT /api/profile` — save the signed-in user's profile.
pub async fn save(State(state): State<AppState>, Json(update): Json<ProfileUpdate>) -> Result<Json<Profile>, AuthError> {
    let profile = state.auth.save_profile(update).await?;
    Ok(Json(profile))
}

/// `POST /api/profile/refresh` — re-resolve the current profile.
pub async fn refresh(State(state): State<AppState>) -> Result<Response, AuthError> {
    match state.auth.refresh_profile().await? {
        Some(profile) => Ok(Json(profile).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
