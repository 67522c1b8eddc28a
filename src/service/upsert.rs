//! Bulk insert-or-update: stage rows in a temp table, then MERGE them into the target.

use crate::config::Entity;
use crate::error::{Phase, SessionError, UpsertError};
use crate::options::UpsertOptions;
use crate::registry::SchemaRegistry;
use crate::session::{BulkCopyOptions, SqlSession};
use crate::table::TabularBuffer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Progress of one upsert over one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertState {
    Idle,
    Opened,
    TempTableCreated,
    Loaded,
    Merged,
    Cleaned,
    Closed,
    /// Only reported in the `bulk upsert failed` log event; a failed call returns an
    /// [`UpsertError`] rather than a summary.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertSummary {
    pub table: String,
    pub rows_loaded: u64,
    /// Rows affected by the MERGE batch, as reported by the session.
    pub rows_merged: u64,
    pub state: UpsertState,
}

pub struct BulkUpsertService {
    registry: Arc<SchemaRegistry>,
}

impl BulkUpsertService {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        BulkUpsertService { registry }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Upserts `records` into their entity's table: matching keys are updated, the rest
    /// inserted, nothing deleted. Each round trip is bounded by `options.timeout_seconds`.
    ///
    /// With `close_connection`, the session is closed on every exit path once it is open.
    /// A failed upsert leaves any temp table in place for the caller to inspect.
    pub async fn bulk_insert_or_update<E, S>(
        &self,
        session: &mut S,
        records: &[E],
        options: &UpsertOptions,
    ) -> Result<UpsertSummary, UpsertError>
    where
        E: Entity,
        S: SqlSession + ?Sized,
    {
        let mut state = UpsertState::Idle;
        let outcome = self.run(session, records, options, &mut state).await;
        if let Err(e) = &outcome {
            tracing::warn!(
                entity = std::any::type_name::<E>(),
                state = ?state,
                phase = ?e.phase(),
                error = %e,
                "bulk upsert failed"
            );
            advance(&mut state, UpsertState::Failed);
        }

        if options.close_connection && session.is_open() {
            match round_trip(Phase::Close, None, session.close()).await {
                Ok(()) if outcome.is_ok() => advance(&mut state, UpsertState::Closed),
                Ok(()) => {}
                Err(e) if outcome.is_ok() => return Err(e),
                Err(e) => tracing::warn!(error = %e, "close after failed upsert also failed"),
            }
        }

        outcome.map(|summary| UpsertSummary { state, ..summary })
    }

    async fn run<E, S>(
        &self,
        session: &mut S,
        records: &[E],
        options: &UpsertOptions,
        state: &mut UpsertState,
    ) -> Result<UpsertSummary, UpsertError>
    where
        E: Entity,
        S: SqlSession + ?Sized,
    {
        if options.open_connection {
            round_trip(Phase::Open, None, session.open()).await?;
            advance(state, UpsertState::Opened);
        }

        let entity = self.registry.configuration::<E>()?;
        let scripts = entity.scripts()?;
        let rows = TabularBuffer::from_records(&entity, records);
        let timeout = options.timeout();

        tracing::debug!(sql = %scripts.create_temp_table, "create temp table");
        round_trip(
            Phase::CreateTempTable,
            timeout,
            session.execute(&scripts.create_temp_table),
        )
        .await?;
        advance(state, UpsertState::TempTableCreated);

        let copy = BulkCopyOptions::staging(timeout);
        let rows_loaded = round_trip(
            Phase::BulkLoad,
            timeout,
            session.bulk_load(&entity.full_temp_table_name, &rows, &copy),
        )
        .await?;
        advance(state, UpsertState::Loaded);

        tracing::debug!(sql = %scripts.merge, "merge");
        let rows_merged = round_trip(Phase::Merge, timeout, session.execute(&scripts.merge)).await?;
        // The DROP TABLE rides in the MERGE batch.
        advance(state, UpsertState::Merged);
        advance(state, UpsertState::Cleaned);

        tracing::info!(
            table = %entity.full_table_name,
            rows_loaded,
            rows_merged,
            "bulk upsert complete"
        );
        Ok(UpsertSummary {
            table: entity.full_table_name.clone(),
            rows_loaded,
            rows_merged,
            state: *state,
        })
    }
}

fn advance(state: &mut UpsertState, next: UpsertState) {
    tracing::debug!(from = ?*state, to = ?next, "upsert state");
    *state = next;
}

/// Awaits one round trip, bounded by `timeout` when set.
async fn round_trip<T, F>(phase: Phase, timeout: Option<Duration>, fut: F) -> Result<T, UpsertError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| UpsertError::Timeout {
                phase,
                seconds: limit.as_secs(),
            })?,
        None => fut.await,
    };
    outcome.map_err(|e| UpsertError::execution(phase, e))
}
