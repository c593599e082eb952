use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::sign_jwt_for_user;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::services::progress::hash_user_key;
use crate::state::AppState;
use crate::validation::{validate_name, validate_student_id};

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    name: String,
    student_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    user_key: String,
    name: String,
    student_id: String,
}

/// There are no passwords: identity is the (name, studentId) pair hashed into
/// a stable anonymous key, registered on first login.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_name(&req.name).map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;
    validate_student_id(&req.student_id)
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let name = req.name.trim().to_string();
    let student_id = req.student_id.trim().to_string();
    let user_key = hash_user_key(&name, &student_id);

    state
        .tracker()
        .ensure_user(&user_key, &name, &student_id)
        .await?;

    let token = sign_jwt_for_user(
        &user_key,
        &state.config().jwt_secret,
        state.config().jwt_expires_in_hours,
    )?;
    tracing::info!(user_key = %user_key, "learner logged in");

    Ok(ok(LoginResponse {
        token,
        user_key,
        name,
        student_id,
    }))
}
