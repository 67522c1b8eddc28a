//! Bulk upsert for SQL Server: map annotated record types to table rows, stage them in a
//! temp table and MERGE them into the target in one batch.

pub mod config;
pub mod dry_run;
pub mod error;
pub mod options;
pub mod registry;
pub mod service;
pub mod session;
pub mod sql;
pub mod table;

pub use config::{resolve, resolve_columns, resolve_table, Column, Entity, EntityConfiguration, EntityDescriptor};
pub use dry_run::{DryRunCall, DryRunSession};
pub use error::{ConfigError, Phase, ScriptError, SessionError, UpsertError};
pub use options::UpsertOptions;
pub use registry::SchemaRegistry;
pub use service::{BulkUpsertService, UpsertState, UpsertSummary};
pub use session::{BulkCopyOptions, SqlSession};
pub use sql::{SqlField, SqlValue, UpsertScripts};
pub use table::TabularBuffer;
