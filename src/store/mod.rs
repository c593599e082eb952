pub mod memory;
pub mod sheets;
pub mod tables;

use thiserror::Error;

pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// A single data row as read from the tabular store: trailing empty cells may
/// be missing, so consumers index defensively.
pub type RawRow = Vec<String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store api error: status={status}, message={message}")]
    Api { status: u16, message: String },
    #[error("store network error: {0}")]
    Network(String),
    #[error("store auth error: {0}")]
    Auth(String),
    #[error("malformed store response: {0}")]
    Malformed(String),
    #[error("invalid row address: {0}")]
    InvalidRow(u64),
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        StoreError::Network(value.to_string())
    }
}

/// Read/write transport for the external tabular store.
///
/// Row addressing follows the spreadsheet convention: row 1 is the header,
/// data rows start at row 2. `read_rows` returns data rows only, in source
/// order; `update_row` takes the absolute (1-based) sheet row number. Row
/// numbers are stable only as long as no rows are deleted out-of-band.
#[axum::async_trait]
pub trait RowStore: Send + Sync {
    async fn read_rows(&self, table: &str) -> Result<Vec<RawRow>, StoreError>;

    async fn append_row(&self, table: &str, fields: &[String]) -> Result<(), StoreError>;

    async fn update_row(
        &self,
        table: &str,
        row_number: u64,
        fields: &[String],
    ) -> Result<(), StoreError>;

    /// Provision missing tables. Idempotent; called once at startup.
    async fn ensure_tables(&self) -> Result<(), StoreError>;
}
