//! Quiz session assembly: bank loading, question selection, answer
//! evaluation, and the per-learner summary numbers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::services::bank::{self, Question, QuestionType};
use crate::services::progress::ProgressTracker;
use crate::services::tokenize::tokenize_cloze_with_particles;
use crate::store::{RowStore, StoreError};

/// Time-boxed memoization of the parsed bank. Purely a read-path shortcut:
/// the bank is recomputed from the store whenever the slot is stale. A zero
/// TTL disables caching entirely.
pub struct BankCache {
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<Vec<Question>>)>>,
}

impl BankCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    async fn get(&self) -> Option<Arc<Vec<Question>>> {
        if self.ttl.is_zero() {
            return None;
        }
        let guard = self.slot.read().await;
        match guard.as_ref() {
            Some((loaded_at, bank)) if loaded_at.elapsed() < self.ttl => Some(bank.clone()),
            _ => None,
        }
    }

    async fn put(&self, bank: Arc<Vec<Question>>) {
        if self.ttl.is_zero() {
            return;
        }
        *self.slot.write().await = Some((Instant::now(), bank));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankStats {
    pub total: usize,
    pub done: usize,
    pub remaining: usize,
}

/// What the learner gets back after submitting an answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_kana: String,
    pub correct_zh: String,
    pub word_original: String,
}

pub struct QuizService {
    store: Arc<dyn RowStore>,
    tracker: ProgressTracker,
    question_tab: String,
    cache: BankCache,
}

impl QuizService {
    pub fn new(store: Arc<dyn RowStore>, question_tab: &str, cache_ttl: Duration) -> Self {
        Self {
            tracker: ProgressTracker::new(store.clone()),
            store,
            question_tab: question_tab.to_string(),
            cache: BankCache::new(cache_ttl),
        }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Reads and parses the bank fresh from the store.
    pub async fn load_bank(&self) -> Result<Vec<Question>, StoreError> {
        let rows = self.store.read_rows(&self.question_tab).await?;
        let bank = bank::parse_bank(&rows);
        tracing::debug!(rows = rows.len(), questions = bank.len(), "question bank parsed");
        Ok(bank)
    }

    /// The memoized bank, used where staleness within the TTL is acceptable
    /// (answer lookup, wrong-question export).
    pub async fn cached_bank(&self) -> Result<Arc<Vec<Question>>, StoreError> {
        if let Some(bank) = self.cache.get().await {
            return Ok(bank);
        }
        let bank = Arc::new(self.load_bank().await?);
        self.cache.put(bank.clone()).await;
        Ok(bank)
    }

    /// Up to `count` never-attempted questions in uniform random order.
    /// Returns fewer when the remaining pool is smaller; never errors on an
    /// exhausted pool. Sentence questions get their render tokens attached.
    pub async fn next_questions(
        &self,
        user_key: &str,
        count: usize,
    ) -> Result<Vec<Question>, StoreError> {
        // Selection always sees the live sheet; only answering tolerates the
        // cache.
        let bank = self.load_bank().await?;
        let progress = self.tracker.progress_map(user_key).await?;

        let mut remaining: Vec<Question> = bank
            .into_iter()
            .filter(|q| !progress.contains_key(&q.qid))
            .collect();
        remaining.shuffle(&mut rand::thread_rng());
        remaining.truncate(count);

        for question in &mut remaining {
            if question.kind == QuestionType::Sentence {
                if let Some(cloze) = &question.cloze {
                    question.cloze_tokens = Some(tokenize_cloze_with_particles(cloze));
                }
            }
        }
        Ok(remaining)
    }

    /// Exact comparison after stripping every whitespace character from both
    /// sides. Deliberately no case folding and no kana width normalization —
    /// the bank is authored in the exact form learners are expected to type.
    pub fn check_answer(question: &Question, raw_answer: &str) -> bool {
        normalize_answer(raw_answer) == normalize_answer(&question.answer_kana)
    }

    /// Evaluates and records a submission. `Ok(None)` when the qid is not in
    /// the bank (the caller maps that to a 404).
    pub async fn submit_answer(
        &self,
        user_key: &str,
        qid: &str,
        answer: &str,
    ) -> Result<Option<AnswerOutcome>, StoreError> {
        let bank = self.cached_bank().await?;
        let Some(question) = bank.iter().find(|q| q.qid == qid) else {
            return Ok(None);
        };

        let is_correct = Self::check_answer(question, answer);
        self.tracker
            .record_attempt(user_key, qid, is_correct, answer)
            .await?;
        if is_correct {
            self.tracker.record_resolved(user_key, qid).await?;
        } else {
            self.tracker.record_wrong(user_key, qid, answer).await?;
        }

        Ok(Some(AnswerOutcome {
            is_correct,
            correct_kana: question.answer_kana.clone(),
            correct_zh: question.answer_zh.clone(),
            word_original: question.word_original.clone(),
        }))
    }

    pub async fn bank_stats(&self, user_key: &str) -> Result<BankStats, StoreError> {
        let bank = self.load_bank().await?;
        let progress = self.tracker.progress_map(user_key).await?;
        let total = bank.len();
        let done = progress.len();
        Ok(BankStats {
            total,
            done,
            remaining: total.saturating_sub(done),
        })
    }

    /// The unresolved wrong questions joined back against the bank, in bank
    /// order. Entries whose qid no longer maps to a question (the sheet was
    /// edited) are skipped.
    pub async fn unresolved_wrong_questions(
        &self,
        user_key: &str,
    ) -> Result<Vec<Question>, StoreError> {
        let wrong = self.tracker.wrong_map(user_key).await?;
        let bank = self.cached_bank().await?;

        Ok(bank
            .iter()
            .filter(|q| wrong.get(&q.qid).is_some_and(|entry| !entry.resolved))
            .cloned()
            .collect())
    }
}

fn normalize_answer(s: &str) -> String {
    s.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tables;
    use crate::store::MemoryStore;

    fn question(qid: &str, kana: &str) -> Question {
        Question {
            qid: qid.to_string(),
            kind: QuestionType::Vocab,
            answer_kana: kana.to_string(),
            answer_zh: "zh".to_string(),
            word_original: "word".to_string(),
            cloze: None,
            cloze_zh: None,
            cloze_tokens: None,
        }
    }

    async fn seed_question(store: &MemoryStore, kana: &str, cloze: &str) {
        store
            .append_row(
                "Questions",
                &[
                    kana.into(),
                    "中文".into(),
                    cloze.into(),
                    if cloze.is_empty() { String::new() } else { "中文例句".into() },
                    "単語".into(),
                ],
            )
            .await
            .unwrap();
    }

    fn service(store: Arc<MemoryStore>) -> QuizService {
        QuizService::new(store, "Questions", Duration::ZERO)
    }

    #[test]
    fn check_answer_strips_whitespace_only() {
        let q = question("QB_R2", "たべる");
        assert!(QuizService::check_answer(&q, "たべる"));
        assert!(QuizService::check_answer(&q, " たべ る\u{3000}"));
        assert!(!QuizService::check_answer(&q, "タベル"));
        assert!(!QuizService::check_answer(&q, ""));
    }

    #[test]
    fn check_answer_is_width_strict() {
        // Half-width katakana is not folded; exact-match semantics preserved.
        let q = question("QB_R2", "ガラス");
        assert!(!QuizService::check_answer(&q, "ｶﾞﾗｽ"));
    }

    #[tokio::test]
    async fn selection_excludes_attempted_questions() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "あ", "").await;
        seed_question(&store, "い", "").await;
        let quiz = service(store);

        quiz.tracker()
            .record_attempt("u1", "QB_R2", true, "あ")
            .await
            .unwrap();

        let questions = quiz.next_questions("u1", 10).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].qid, "QB_R3");
    }

    #[tokio::test]
    async fn selection_exhaustion_returns_short_list() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "あ", "").await;
        seed_question(&store, "い", "").await;
        let quiz = service(store);

        let questions = quiz.next_questions("u1", 50).await.unwrap();
        assert_eq!(questions.len(), 2);

        let none = quiz.next_questions("u2", 0).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn sentence_questions_get_render_tokens() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "たべる", "ご飯を（たべる）た").await;
        let quiz = service(store);

        let questions = quiz.next_questions("u1", 10).await.unwrap();
        assert_eq!(questions.len(), 1);
        let tokens = questions[0].cloze_tokens.as_ref().unwrap();
        assert!(tokens.iter().any(|t| t.is_blank));
        assert!(tokens.iter().any(|t| t.is_particle && t.text == "を"));
    }

    #[tokio::test]
    async fn submit_answer_round_trip() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "あ", "").await;
        let quiz = service(store.clone());

        let wrong = quiz.submit_answer("u1", "QB_R2", "x").await.unwrap().unwrap();
        assert!(!wrong.is_correct);
        assert_eq!(wrong.correct_kana, "あ");

        let right = quiz.submit_answer("u1", "QB_R2", "あ").await.unwrap().unwrap();
        assert!(right.is_correct);

        // wrong entry created, then resolved by the correct retry
        let wrong_map = quiz.tracker().wrong_map("u1").await.unwrap();
        assert!(wrong_map.get("QB_R2").unwrap().resolved);

        let progress = quiz.tracker().progress_map("u1").await.unwrap();
        assert_eq!(progress.get("QB_R2").unwrap().attempts, 2);
        assert_eq!(store.read_rows(tables::PROGRESS).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_unknown_qid_returns_none() {
        let store = Arc::new(MemoryStore::new("Questions"));
        let quiz = service(store);
        assert!(quiz.submit_answer("u1", "QB_R99", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bank_stats_add_up() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "あ", "").await;
        seed_question(&store, "い", "").await;
        seed_question(&store, "う", "").await;
        let quiz = service(store);

        quiz.submit_answer("u1", "QB_R2", "あ").await.unwrap();
        let stats = quiz.bank_stats("u1").await.unwrap();
        assert_eq!(stats, BankStats { total: 3, done: 1, remaining: 2 });
    }

    #[tokio::test]
    async fn unresolved_wrong_questions_in_bank_order() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "あ", "").await;
        seed_question(&store, "い", "").await;
        let quiz = service(store);

        quiz.submit_answer("u1", "QB_R3", "x").await.unwrap();
        quiz.submit_answer("u1", "QB_R2", "x").await.unwrap();

        let wrong = quiz.unresolved_wrong_questions("u1").await.unwrap();
        let qids: Vec<&str> = wrong.iter().map(|q| q.qid.as_str()).collect();
        assert_eq!(qids, vec!["QB_R2", "QB_R3"]);

        quiz.submit_answer("u1", "QB_R2", "あ").await.unwrap();
        let wrong = quiz.unresolved_wrong_questions("u1").await.unwrap();
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].qid, "QB_R3");
    }

    #[tokio::test]
    async fn cache_serves_stale_bank_within_ttl() {
        let store = Arc::new(MemoryStore::new("Questions"));
        seed_question(&store, "あ", "").await;
        let quiz = QuizService::new(store.clone(), "Questions", Duration::from_secs(3600));

        assert_eq!(quiz.cached_bank().await.unwrap().len(), 1);
        seed_question(&store, "い", "").await;
        // Within the TTL the second row is not seen yet.
        assert_eq!(quiz.cached_bank().await.unwrap().len(), 1);
        // Fresh loads bypass the cache.
        assert_eq!(quiz.load_bank().await.unwrap().len(), 2);
    }
}
