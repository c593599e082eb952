mod common;

use axum::http::{Method, StatusCode};

use quiz_backend::store::RowStore;

use common::app::{seed_bank_row, spawn_test_app, TestApp};
use common::auth::{auth_header, login_as};
use common::http::{request, response_json};

async fn seed_two_questions(app: &TestApp) {
    seed_bank_row(app, &["たべる", "吃", "", "", "食べる"]).await;
    seed_bank_row(app, &["のむ", "喝", "", "", "飲む"]).await;
}

async fn answer(app: &TestApp, auth: &[(&str, String)], qid: &str, answer: &str) {
    let response = request(
        &app.app,
        Method::POST,
        "/api/quiz/answer",
        Some(serde_json::json!({ "qid": qid, "answer": answer })),
        auth,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn summary(app: &TestApp, auth: &[(&str, String)]) -> serde_json::Value {
    let response = request(&app.app, Method::GET, "/api/me/summary", None, auth).await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn it_summary_tracks_done_and_wrong_counts() {
    let app = spawn_test_app().await;
    seed_two_questions(&app).await;
    let token = login_as(&app.app, "田中", "S01").await;
    let auth = [("authorization", auth_header(&token))];

    let initial = summary(&app, &auth).await;
    assert_eq!(initial["total"], 2);
    assert_eq!(initial["done"], 0);
    assert_eq!(initial["remaining"], 2);
    assert_eq!(initial["wrongUnresolved"], 0);

    answer(&app, &auth, "QB_R2", "wrong").await;
    answer(&app, &auth, "QB_R3", "のむ").await;

    let after = summary(&app, &auth).await;
    assert_eq!(after["done"], 2);
    assert_eq!(after["remaining"], 0);
    assert_eq!(after["wrongUnresolved"], 1);

    // Answering the missed question correctly resolves the wrong entry.
    answer(&app, &auth, "QB_R2", "たべる").await;
    let resolved = summary(&app, &auth).await;
    assert_eq!(resolved["wrongUnresolved"], 0);
}

#[tokio::test]
async fn it_reset_restores_a_clean_slate_without_deleting_rows() {
    let app = spawn_test_app().await;
    seed_two_questions(&app).await;
    let token = login_as(&app.app, "田中", "S01").await;
    let auth = [("authorization", auth_header(&token))];

    answer(&app, &auth, "QB_R2", "wrong").await;
    assert_eq!(summary(&app, &auth).await["done"], 1);

    // Keep the watermark strictly ahead of the progress row's timestamp.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let response = request(&app.app, Method::POST, "/api/me/reset", None, &auth).await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ok"], true);

    let after = summary(&app, &auth).await;
    assert_eq!(after["done"], 0);
    assert_eq!(after["remaining"], 2);
    assert_eq!(after["wrongUnresolved"], 0);

    // Audit trail: nothing was physically deleted.
    assert_eq!(app.store.read_rows("Progress").await.unwrap().len(), 1);
    assert_eq!(app.store.read_rows("WrongBank").await.unwrap().len(), 1);
}

#[tokio::test]
async fn it_wrong_export_lists_unresolved_questions_with_profile() {
    let app = spawn_test_app().await;
    seed_two_questions(&app).await;
    let token = login_as(&app.app, "田中", "S01").await;
    let auth = [("authorization", auth_header(&token))];

    answer(&app, &auth, "QB_R3", "x").await;

    let response = request(&app.app, Method::GET, "/api/me/wrong", None, &auth).await;
    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "田中");
    assert_eq!(body["data"]["studentId"], "S01");

    let questions = body["data"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["qid"], "QB_R3");
    assert_eq!(questions[0]["answerKana"], "のむ");
}

#[tokio::test]
async fn it_users_are_isolated() {
    let app = spawn_test_app().await;
    seed_two_questions(&app).await;

    let token_a = login_as(&app.app, "田中", "S01").await;
    let token_b = login_as(&app.app, "佐藤", "S02").await;
    let auth_a = [("authorization", auth_header(&token_a))];
    let auth_b = [("authorization", auth_header(&token_b))];

    answer(&app, &auth_a, "QB_R2", "wrong").await;

    assert_eq!(summary(&app, &auth_a).await["done"], 1);
    assert_eq!(summary(&app, &auth_b).await["done"], 0);
}
