use axum::http::Method;
use axum::Router;

use super::http::{request, response_json};

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

/// Logs in a fresh learner and returns their access token.
pub async fn login_and_get_token(app: &Router) -> String {
    let unique = uuid::Uuid::new_v4().simple().to_string();
    login_as(app, "テスト太郎", &format!("S-{}", &unique[..16])).await
}

pub async fn login_as(app: &Router, name: &str, student_id: &str) -> String {
    let response = request(
        app,
        Method::POST,
        "/api/auth/login",
        Some(serde_json::json!({ "name": name, "studentId": student_id })),
        &[],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert!(status.is_success(), "login failed: {body}");
    body["data"]["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}
