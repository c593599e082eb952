//! Table (sheet tab) names and their column layouts.
//!
//! Cells are plain strings; timestamps are RFC3339. Data rows start at sheet
//! row 2, row 1 being the header.

/// 使用者表：`[userKey, name, studentId, createdAt]`
pub const USERS: &str = "Users";

/// 作答进度表：`[userKey, qid, status, attempts, lastAnswer, updatedAt]`
pub const PROGRESS: &str = "Progress";

/// 错题表：`[userKey, qid, lastWrongAnswer, resolved, addedAt, resolvedAt]`
pub const WRONG: &str = "WrongBank";

/// 重置事件表（append-only）：`[userKey, resetAt]`
pub const RESETS: &str = "Resets";

/// 题库表默认 tab 名：`[kana, zh, cloze, clozeZh, wordOriginal]`
/// The actual tab is configurable (`SHEETS_QUESTION_TAB`).
pub const DEFAULT_QUESTION_TAB: &str = "Questions";

/// First data row of every table (row 1 is the header).
pub const FIRST_DATA_ROW: u64 = 2;

/// Absolute sheet row number for the data row at `index` in a `read_rows`
/// result.
pub fn data_row_number(index: usize) -> u64 {
    index as u64 + FIRST_DATA_ROW
}

/// Tables provisioned by `ensure_tables`. The question tab is created empty
/// when missing; its rows are authored by hand.
pub fn provisioned(question_tab: &str) -> Vec<String> {
    vec![
        USERS.to_string(),
        PROGRESS.to_string(),
        WRONG.to_string(),
        RESETS.to_string(),
        question_tab.to_string(),
    ]
}
