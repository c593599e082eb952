use std::sync::Arc;

use axum::Router;
use tokio::sync::broadcast;

use quiz_backend::config::{Config, QuizConfig, SheetsConfig};
use quiz_backend::routes::build_router;
use quiz_backend::state::AppState;
use quiz_backend::store::{MemoryStore, RowStore};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

/// Router + in-memory store. Config is built directly instead of via env vars
/// to avoid set_var races across parallel tests; the bank cache is disabled so
/// rows seeded mid-test are always visible.
pub async fn spawn_test_app() -> TestApp {
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3001,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        jwt_secret: format!("integration-test-jwt-secret-{}", uuid::Uuid::new_v4()),
        jwt_expires_in_hours: 24,
        cors_origin: "*".to_string(),
        bank_cache_ttl_secs: 0,
        quiz: QuizConfig {
            default_count: 25,
            max_count: 50,
        },
        sheets: SheetsConfig {
            mock: true,
            spreadsheet_id: String::new(),
            service_account_email: String::new(),
            private_key: String::new(),
            question_tab: "Questions".to_string(),
            timeout_secs: 5,
        },
    };

    let store = Arc::new(MemoryStore::new(&config.sheets.question_tab));
    store.ensure_tables().await.expect("provision tables");

    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(store.clone(), &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp { app, state, store }
}

/// Seeds one question-bank row `[kana, zh, cloze, clozeZh, wordOriginal]`.
pub async fn seed_bank_row(app: &TestApp, cells: &[&str]) {
    let fields: Vec<String> = cells.iter().map(|s| s.to_string()).collect();
    app.store
        .append_row("Questions", &fields)
        .await
        .expect("seed bank row");
}
