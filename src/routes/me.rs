use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/reset", post(reset))
        .route("/wrong", get(wrong_questions))
}

async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.quiz().bank_stats(&auth.user_key).await?;
    let wrong_map = state.tracker().wrong_map(&auth.user_key).await?;
    let wrong_unresolved = wrong_map.values().filter(|e| !e.resolved).count();

    Ok(ok(serde_json::json!({
        "total": stats.total,
        "done": stats.done,
        "remaining": stats.remaining,
        "wrongUnresolved": wrong_unresolved,
    })))
}

/// Appends a reset event; prior progress/wrong rows become invisible but are
/// kept in the sheet.
async fn reset(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.tracker().add_reset(&auth.user_key).await?;
    tracing::info!(user_key = %auth.user_key, "progress reset");
    Ok(ok(serde_json::json!({ "ok": true })))
}

/// The unresolved wrong questions with the learner's profile, ready for the
/// frontend to render as a review sheet.
async fn wrong_questions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .tracker()
        .user_profile(&auth.user_key)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let questions = state
        .quiz()
        .unresolved_wrong_questions(&auth.user_key)
        .await?;

    Ok(ok(serde_json::json!({
        "name": profile.name,
        "studentId": profile.student_id,
        "questions": questions,
    })))
}
