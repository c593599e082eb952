use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::validate_answer;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next", get(next_questions))
        .route("/answer", post(submit_answer))
}

#[derive(Debug, Deserialize)]
struct NextQuery {
    count: Option<u64>,
}

async fn next_questions(
    auth: AuthUser,
    Query(query): Query<NextQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_cfg = &state.config().quiz;
    let count = query
        .count
        .unwrap_or(quiz_cfg.default_count)
        .clamp(1, quiz_cfg.max_count) as usize;

    let questions = state.quiz().next_questions(&auth.user_key, count).await?;
    let returned = questions.len();

    Ok(ok(serde_json::json!({
        "questions": questions,
        "count": returned,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    qid: String,
    #[serde(default)]
    answer: String,
}

async fn submit_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.qid.trim().is_empty() {
        return Err(AppError::bad_request("VALIDATION_ERROR", "qid is required"));
    }
    validate_answer(&req.answer)
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let outcome = state
        .quiz()
        .submit_answer(&auth.user_key, &req.qid, &req.answer)
        .await?
        .ok_or_else(|| AppError::not_found("Question not found"))?;

    Ok(ok(outcome))
}
