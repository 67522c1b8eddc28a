//! The database seam: one connection that runs statements and bulk-copies rows.

use crate::error::SessionError;
use crate::table::TabularBuffer;
use async_trait::async_trait;
use std::time::Duration;

/// Settings passed to the bulk copy. The upsert always asks for all three flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkCopyOptions {
    /// Hold a table lock on the destination for the duration of the copy.
    pub table_lock: bool,
    /// Fire insert triggers on the destination.
    pub fire_triggers: bool,
    /// Run the copy in its own transaction.
    pub use_internal_transaction: bool,
    /// Server-side budget for the copy; `None` means no limit.
    pub timeout: Option<Duration>,
}

impl BulkCopyOptions {
    pub fn staging(timeout: Option<Duration>) -> Self {
        BulkCopyOptions {
            table_lock: true,
            fire_triggers: true,
            use_internal_transaction: true,
            timeout,
        }
    }
}

/// A single SQL Server connection. Callers serialize use per session.
#[async_trait]
pub trait SqlSession: Send {
    fn is_open(&self) -> bool;

    async fn open(&mut self) -> Result<(), SessionError>;

    async fn close(&mut self) -> Result<(), SessionError>;

    /// Runs a statement batch and returns the number of rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, SessionError>;

    /// Copies every row of `rows` into `destination`, preserving column order.
    async fn bulk_load(
        &mut self,
        destination: &str,
        rows: &TabularBuffer,
        options: &BulkCopyOptions,
    ) -> Result<u64, SessionError>;
}
