//! Typed errors: configuration, script generation and execution.

use std::fmt;
use thiserror::Error;

/// Error produced by a [`SqlSession`](crate::session::SqlSession) implementation.
pub type SessionError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the '{entity}' entity should be configured with a table annotation")]
    MissingTable { entity: &'static str },
    #[error("the '{field}' field of '{entity}' should be annotated as a column or ignored")]
    UnmappedField { entity: &'static str, field: &'static str },
    #[error(
        "the '{field}' field of '{entity}' can't be used as a primary key: \
         '{existing}' is already the primary key and only one is allowed"
    )]
    DuplicatePrimaryKey {
        entity: &'static str,
        field: &'static str,
        existing: &'static str,
    },
    #[error("column '{column}' of '{entity}' is mapped by both '{first}' and '{second}'")]
    DuplicateColumn {
        entity: &'static str,
        column: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("invalid {kind} identifier '{name}' on '{entity}'")]
    InvalidIdentifier {
        entity: &'static str,
        kind: &'static str,
        name: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("column '{column}' has type {type_name}, which doesn't match any SQL type mapping")]
    UnsupportedType {
        column: String,
        type_name: &'static str,
    },
    #[error("unable to proceed with the operation, because the primary key of the {table} table was not found")]
    MissingPrimaryKey { table: String },
    #[error("the {table} table has no columns besides its primary key, so there is nothing to update or insert")]
    NoValueColumns { table: String },
}

/// Round trip of an upsert, used to report where a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Open,
    CreateTempTable,
    BulkLoad,
    Merge,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Open => "open connection",
            Phase::CreateTempTable => "create temp table",
            Phase::BulkLoad => "bulk load",
            Phase::Merge => "merge",
            Phase::Close => "close connection",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum UpsertError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("{phase} failed: {source}")]
    Execution {
        phase: Phase,
        #[source]
        source: SessionError,
    },
    #[error("{phase} timed out after {seconds}s")]
    Timeout { phase: Phase, seconds: u64 },
}

impl UpsertError {
    pub fn execution(phase: Phase, source: SessionError) -> Self {
        UpsertError::Execution { phase, source }
    }

    /// Phase that failed, for errors raised by a database round trip.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            UpsertError::Execution { phase, .. } | UpsertError::Timeout { phase, .. } => Some(*phase),
            UpsertError::Config(_) | UpsertError::Script(_) => None,
        }
    }
}
