//! Per-learner progress and wrong-answer state.
//!
//! The store holds an event log: progress rows (updated in place once they
//! exist), wrong rows (same), and append-only reset events. A learner's
//! current state is a pure reduction of that log filtered by the reset
//! watermark — rows strictly older than the latest reset stay in the sheet for
//! audit but are invisible to every derived view. Reset therefore never
//! deletes anything.
//!
//! Concurrency: read-modify-write per row, last writer wins. Racing
//! submissions for the same learner can lose an attempt increment; accepted
//! for a single-learner-at-a-time usage model.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::store::tables::{self, data_row_number};
use crate::store::{RowStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Correct,
    Wrong,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Correct => "correct",
            AttemptStatus::Wrong => "wrong",
        }
    }

    /// Anything that isn't literally `correct` counts as wrong; sheet cells
    /// are occasionally hand-edited.
    fn parse(cell: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case("correct") {
            AttemptStatus::Correct
        } else {
            AttemptStatus::Wrong
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub user_key: String,
    pub qid: String,
    pub status: AttemptStatus,
    pub attempts: u32,
    pub last_answer: String,
    /// None when the cell is empty or unparsable; such rows pass the reset
    /// filter (benefit of the doubt for hand-edited data).
    pub updated_at: Option<DateTime<Utc>>,
    /// Absolute sheet row, used for in-place updates.
    pub row_number: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrongEntry {
    pub user_key: String,
    pub qid: String,
    pub last_wrong_answer: String,
    pub resolved: bool,
    pub added_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub row_number: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub student_id: String,
}

/// Stable anonymous learner key: `hex(sha256("name|studentId"))`.
pub fn hash_user_key(name: &str, student_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}", name.trim(), student_id.trim()).as_bytes());
    hex::encode(hasher.finalize())
}

fn now_cell() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(cell: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(cell.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn ts_cell(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", |s| s.as_str())
}

#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn RowStore>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// The learner's active reset watermark: the latest reset event, or the
    /// Unix epoch when none exists.
    pub async fn latest_reset_at(&self, user_key: &str) -> Result<DateTime<Utc>, StoreError> {
        let rows = self.store.read_rows(tables::RESETS).await?;
        let mut latest = DateTime::<Utc>::UNIX_EPOCH;
        for row in &rows {
            if cell(row, 0) != user_key {
                continue;
            }
            if let Some(ts) = parse_ts(cell(row, 1)) {
                if ts > latest {
                    latest = ts;
                }
            }
        }
        Ok(latest)
    }

    pub async fn add_reset(&self, user_key: &str) -> Result<(), StoreError> {
        self.store
            .append_row(tables::RESETS, &[user_key.to_string(), now_cell()])
            .await
    }

    pub async fn ensure_user(
        &self,
        user_key: &str,
        name: &str,
        student_id: &str,
    ) -> Result<(), StoreError> {
        let rows = self.store.read_rows(tables::USERS).await?;
        if rows.iter().any(|row| cell(row, 0) == user_key) {
            return Ok(());
        }
        self.store
            .append_row(
                tables::USERS,
                &[
                    user_key.to_string(),
                    name.trim().to_string(),
                    student_id.trim().to_string(),
                    now_cell(),
                ],
            )
            .await
    }

    pub async fn user_profile(&self, user_key: &str) -> Result<Option<UserProfile>, StoreError> {
        let rows = self.store.read_rows(tables::USERS).await?;
        Ok(rows.iter().find(|row| cell(row, 0) == user_key).map(|row| {
            UserProfile {
                name: cell(row, 1).to_string(),
                student_id: cell(row, 2).to_string(),
            }
        }))
    }

    /// Current progress per question, reset-filtered. When duplicate qids are
    /// visible (possible after a reset orphaned an older row), the later row
    /// wins, matching the write path which always updates the visible row.
    pub async fn progress_map(
        &self,
        user_key: &str,
    ) -> Result<HashMap<String, ProgressEntry>, StoreError> {
        let reset_at = self.latest_reset_at(user_key).await?;
        let rows = self.store.read_rows(tables::PROGRESS).await?;

        let mut map = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            if cell(row, 0) != user_key {
                continue;
            }
            let qid = cell(row, 1);
            if qid.is_empty() {
                continue;
            }
            let updated_at = parse_ts(cell(row, 5));
            if matches!(updated_at, Some(ts) if ts < reset_at) {
                continue;
            }
            let attempts = cell(row, 3).trim().parse::<u32>().unwrap_or(1);

            map.insert(
                qid.to_string(),
                ProgressEntry {
                    user_key: user_key.to_string(),
                    qid: qid.to_string(),
                    status: AttemptStatus::parse(cell(row, 2)),
                    attempts,
                    last_answer: cell(row, 4).to_string(),
                    updated_at,
                    row_number: data_row_number(index),
                },
            );
        }
        Ok(map)
    }

    /// Current wrong/resolved status per question, filtered by `added_at`
    /// against the same reset watermark.
    pub async fn wrong_map(
        &self,
        user_key: &str,
    ) -> Result<HashMap<String, WrongEntry>, StoreError> {
        let reset_at = self.latest_reset_at(user_key).await?;
        let rows = self.store.read_rows(tables::WRONG).await?;

        let mut map = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            if cell(row, 0) != user_key {
                continue;
            }
            let qid = cell(row, 1);
            if qid.is_empty() {
                continue;
            }
            let added_at = parse_ts(cell(row, 4));
            if matches!(added_at, Some(ts) if ts < reset_at) {
                continue;
            }

            map.insert(
                qid.to_string(),
                WrongEntry {
                    user_key: user_key.to_string(),
                    qid: qid.to_string(),
                    last_wrong_answer: cell(row, 2).to_string(),
                    resolved: cell(row, 3).trim().eq_ignore_ascii_case("true"),
                    added_at,
                    resolved_at: parse_ts(cell(row, 5)),
                    row_number: data_row_number(index),
                },
            );
        }
        Ok(map)
    }

    /// Records an attempt. Read-modify-write: the visible row for
    /// (user, qid) is overwritten with an incremented attempts counter, or a
    /// fresh row with `attempts = 1` is appended when none is visible.
    pub async fn record_attempt(
        &self,
        user_key: &str,
        qid: &str,
        is_correct: bool,
        answer: &str,
    ) -> Result<(), StoreError> {
        let status = if is_correct {
            AttemptStatus::Correct
        } else {
            AttemptStatus::Wrong
        };
        let map = self.progress_map(user_key).await?;

        match map.get(qid) {
            Some(existing) => {
                let fields = progress_fields(
                    user_key,
                    qid,
                    status,
                    existing.attempts.saturating_add(1),
                    answer,
                );
                self.store
                    .update_row(tables::PROGRESS, existing.row_number, &fields)
                    .await
            }
            None => {
                let fields = progress_fields(user_key, qid, status, 1, answer);
                self.store.append_row(tables::PROGRESS, &fields).await
            }
        }
    }

    /// Creates or re-opens a wrong entry. Re-opening preserves the original
    /// `added_at` and clears `resolved_at`.
    pub async fn record_wrong(
        &self,
        user_key: &str,
        qid: &str,
        answer: &str,
    ) -> Result<(), StoreError> {
        let map = self.wrong_map(user_key).await?;

        match map.get(qid) {
            Some(existing) => {
                let added_at = ts_cell(existing.added_at.or_else(|| Some(Utc::now())));
                let fields = wrong_fields(user_key, qid, answer, false, &added_at, "");
                self.store
                    .update_row(tables::WRONG, existing.row_number, &fields)
                    .await
            }
            None => {
                let fields = wrong_fields(user_key, qid, answer, false, &now_cell(), "");
                self.store.append_row(tables::WRONG, &fields).await
            }
        }
    }

    /// Marks the wrong entry resolved. No-op when no wrong entry is visible —
    /// answering correctly on the first try is not a resolution event.
    pub async fn record_resolved(&self, user_key: &str, qid: &str) -> Result<(), StoreError> {
        let map = self.wrong_map(user_key).await?;
        let Some(existing) = map.get(qid) else {
            return Ok(());
        };

        let added_at = ts_cell(existing.added_at.or_else(|| Some(Utc::now())));
        let fields = wrong_fields(
            user_key,
            qid,
            &existing.last_wrong_answer,
            true,
            &added_at,
            &now_cell(),
        );
        self.store
            .update_row(tables::WRONG, existing.row_number, &fields)
            .await
    }
}

fn progress_fields(
    user_key: &str,
    qid: &str,
    status: AttemptStatus,
    attempts: u32,
    last_answer: &str,
) -> Vec<String> {
    vec![
        user_key.to_string(),
        qid.to_string(),
        status.as_str().to_string(),
        attempts.to_string(),
        last_answer.to_string(),
        now_cell(),
    ]
}

fn wrong_fields(
    user_key: &str,
    qid: &str,
    last_wrong_answer: &str,
    resolved: bool,
    added_at: &str,
    resolved_at: &str,
) -> Vec<String> {
    vec![
        user_key.to_string(),
        qid.to_string(),
        last_wrong_answer.to_string(),
        resolved.to_string(),
        added_at.to_string(),
        resolved_at.to_string(),
    ]
}
