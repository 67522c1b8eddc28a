//! Upsert execution against a SQL session.

pub mod upsert;

pub use upsert::{BulkUpsertService, UpsertState, UpsertSummary};
