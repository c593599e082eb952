use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::config::Config;
use crate::services::progress::ProgressTracker;
use crate::services::quiz::QuizService;
use crate::store::RowStore;

/// Process-wide wiring. The store client and the quiz service (with its bank
/// cache) are constructed once at startup and injected here — nothing in the
/// core reaches for ambient globals, so tests swap in an in-memory store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RowStore>,
    quiz: Arc<QuizService>,
    tracker: ProgressTracker,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RowStore>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let quiz = Arc::new(QuizService::new(
            store.clone(),
            &config.sheets.question_tab,
            Duration::from_secs(config.bank_cache_ttl_secs),
        ));

        Self {
            tracker: ProgressTracker::new(store.clone()),
            store,
            quiz,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RowStore> {
        &self.store
    }

    pub fn quiz(&self) -> &QuizService {
        &self.quiz
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
