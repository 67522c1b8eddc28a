//! Record list to tabular buffer: the row set handed to the bulk copy.

use crate::config::EntityConfiguration;
use crate::sql::SqlValue;
use serde::Serialize;

/// Rows in the temp table's column order, tagged with the target table's name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TabularBuffer {
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TabularBuffer {
    pub fn from_records<E>(entity: &EntityConfiguration<E>, records: &[E]) -> Self {
        let rows: Vec<Vec<SqlValue>> = records
            .iter()
            .map(|record| entity.columns.iter().map(|c| c.value(record)).collect())
            .collect();
        TabularBuffer {
            table_name: entity.full_table_name.clone(),
            columns: entity.columns.iter().map(|c| c.name.clone()).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
