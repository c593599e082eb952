//! Question-bank ingestion.
//!
//! The source is a hand-maintained spreadsheet with five columns,
//! `[kana, zh, cloze, clozeZh, wordOriginal]`, using the "merged cell"
//! convention: a word's kana/gloss/original appear once, the example-sentence
//! rows beneath it leave those cells empty. The scan models that convention as
//! three carry-forward variables, cleared on an entirely blank row.

use serde::{Deserialize, Serialize};

use crate::services::tokenize::RenderToken;
use crate::store::RawRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Vocab,
    Sentence,
}

/// Immutable quiz question. `cloze`/`cloze_zh` are present iff the type is
/// `sentence`; `answer_kana`/`answer_zh`/`word_original` are always non-empty
/// for a materialized question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub qid: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub answer_kana: String,
    pub answer_zh: String,
    pub word_original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloze: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloze_zh: Option<String>,
    /// Attached by question selection for sentence questions; never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloze_tokens: Option<Vec<RenderToken>>,
}

/// Stable id for the question materialized from the data row at `index`
/// (0-based position in the `read_rows` result, sheet row = index + 2).
///
/// Known limitation: inserting or removing rows upstream of a question shifts
/// its id. Accepted — the sheet is append-mostly and a reshuffle just makes
/// affected questions look unattempted.
pub fn qid_for_row(index: usize) -> String {
    format!("QB_R{}", crate::store::tables::data_row_number(index))
}

fn cell(row: &RawRow, index: usize) -> &str {
    row.get(index).map_or("", |s| s.as_str().trim())
}

/// Parses raw sheet rows into the ordered question list.
///
/// Rows that cannot be bound to a complete word record (kana, gloss and
/// dictionary form all known) are dropped rather than surfaced as errors:
/// spreadsheet data is expected to be messy, and an orphaned sentence must
/// never become a question with an incomplete answer key.
pub fn parse_bank(rows: &[RawRow]) -> Vec<Question> {
    let mut cur_kana = String::new();
    let mut cur_zh = String::new();
    let mut cur_word = String::new();

    let mut questions = Vec::new();
    let mut dropped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let kana = cell(row, 0);
        let zh = cell(row, 1);
        let cloze = cell(row, 2);
        let cloze_zh = cell(row, 3);
        let word = cell(row, 4);

        let has_word_cells = !kana.is_empty() || !zh.is_empty() || !word.is_empty();
        let has_sentence = !cloze.is_empty() || !cloze_zh.is_empty();

        // 整列空白 → 分隔列，清空沿用状态，避免后面的例句被绑到前一个单字
        if !has_word_cells && !has_sentence {
            cur_kana.clear();
            cur_zh.clear();
            cur_word.clear();
            continue;
        }

        if !kana.is_empty() {
            cur_kana = kana.to_string();
        }
        if !zh.is_empty() {
            cur_zh = zh.to_string();
        }
        if !word.is_empty() {
            cur_word = word.to_string();
        }

        let complete = !cur_kana.is_empty() && !cur_zh.is_empty() && !cur_word.is_empty();
        if !complete {
            dropped += 1;
            continue;
        }

        if has_sentence {
            questions.push(Question {
                qid: qid_for_row(index),
                kind: QuestionType::Sentence,
                answer_kana: cur_kana.clone(),
                answer_zh: cur_zh.clone(),
                word_original: cur_word.clone(),
                cloze: Some(cloze.to_string()),
                cloze_zh: Some(cloze_zh.to_string()),
                cloze_tokens: None,
            });
        } else {
            questions.push(Question {
                qid: qid_for_row(index),
                kind: QuestionType::Vocab,
                answer_kana: cur_kana.clone(),
                answer_zh: cur_zh.clone(),
                word_original: cur_word.clone(),
                cloze: None,
                cloze_zh: None,
                cloze_tokens: None,
            });
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, total = questions.len(), "orphan rows excluded from bank");
    }
    questions
}
