use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::tables::{self, FIRST_DATA_ROW};
use crate::store::{RawRow, RowStore, StoreError};

/// In-memory substitute for the spreadsheet transport.
///
/// Used by the integration tests and by `SHEETS_MOCK=true` local runs. Same
/// addressing contract as the real store: data rows start at sheet row 2.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<RawRow>>>,
    question_tab: String,
}

impl MemoryStore {
    pub fn new(question_tab: &str) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            question_tab: question_tab.to_string(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<RawRow>>> {
        // Mutex poisoning only happens after a panic in a writer; recover the
        // data rather than cascading the panic across requests.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[axum::async_trait]
impl RowStore for MemoryStore {
    async fn read_rows(&self, table: &str) -> Result<Vec<RawRow>, StoreError> {
        Ok(self.lock().get(table).cloned().unwrap_or_default())
    }

    async fn append_row(&self, table: &str, fields: &[String]) -> Result<(), StoreError> {
        self.lock()
            .entry(table.to_string())
            .or_default()
            .push(fields.to_vec());
        Ok(())
    }

    async fn update_row(
        &self,
        table: &str,
        row_number: u64,
        fields: &[String],
    ) -> Result<(), StoreError> {
        if row_number < FIRST_DATA_ROW {
            return Err(StoreError::InvalidRow(row_number));
        }
        let index = (row_number - FIRST_DATA_ROW) as usize;
        let mut guard = self.lock();
        let rows = guard.entry(table.to_string()).or_default();
        match rows.get_mut(index) {
            Some(slot) => {
                *slot = fields.to_vec();
                Ok(())
            }
            None => Err(StoreError::InvalidRow(row_number)),
        }
    }

    async fn ensure_tables(&self) -> Result<(), StoreError> {
        let mut guard = self.lock();
        for table in tables::provisioned(&self.question_tab) {
            guard.entry(table).or_default();
        }
        Ok(())
    }
}
