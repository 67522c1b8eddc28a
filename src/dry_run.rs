//! A session that runs nothing: it records and logs what an upsert would send.

use crate::error::SessionError;
use crate::session::{BulkCopyOptions, SqlSession};
use crate::table::TabularBuffer;
use async_trait::async_trait;

/// One call received by a [`DryRunSession`].
#[derive(Clone, Debug, PartialEq)]
pub enum DryRunCall {
    Open,
    Close,
    Execute(String),
    BulkLoad {
        destination: String,
        rows: usize,
        options: BulkCopyOptions,
    },
}

#[derive(Debug, Default)]
pub struct DryRunSession {
    open: bool,
    calls: Vec<DryRunCall>,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts out open, for upserts run with `open_connection = false`.
    pub fn opened() -> Self {
        DryRunSession {
            open: true,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DryRunCall] {
        &self.calls
    }

    /// Statement batches in the order they were sent.
    pub fn statements(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DryRunCall::Execute(sql) => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SqlSession for DryRunSession {
    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> Result<(), SessionError> {
        if self.open {
            return Err("the connection was not closed".into());
        }
        self.open = true;
        self.calls.push(DryRunCall::Open);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.open = false;
        self.calls.push(DryRunCall::Close);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, SessionError> {
        if !self.open {
            return Err("execute requires an open connection".into());
        }
        tracing::info!(sql = %sql, "dry run: execute");
        self.calls.push(DryRunCall::Execute(sql.to_string()));
        Ok(0)
    }

    async fn bulk_load(
        &mut self,
        destination: &str,
        rows: &TabularBuffer,
        options: &BulkCopyOptions,
    ) -> Result<u64, SessionError> {
        if !self.open {
            return Err("bulk load requires an open connection".into());
        }
        let preview = serde_json::to_string(&rows.rows)?;
        tracing::info!(destination = %destination, rows = rows.len(), values = %preview, "dry run: bulk load");
        self.calls.push(DryRunCall::BulkLoad {
            destination: destination.to_string(),
            rows: rows.len(),
            options: options.clone(),
        });
        Ok(rows.len() as u64)
    }
}
