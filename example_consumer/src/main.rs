//! Example consumer: a separate Rust project that uses bulk-upsert as a dependency.
//!
//! Runs an upsert against a dry-run session and logs every statement and bulk copy it
//! would send to SQL Server.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use bulk_upsert::{impl_sql_enum, BulkUpsertService, DryRunSession, Entity, EntityDescriptor, SchemaRegistry, UpsertOptions};
use chrono::NaiveDateTime;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
enum Status {
    Active = 1,
    Suspended = 2,
}

impl_sql_enum!(Status);

struct Customer {
    id: i64,
    name: String,
    status: Status,
    last_seen: Option<NaiveDateTime>,
    // Not persisted.
    session_token: String,
}

impl Entity for Customer {
    fn describe(d: &mut EntityDescriptor<Self>) {
        d.table("Customers").schema("dbo");
        d.field("id", |c| &c.id).column("Id").primary_key();
        d.field("name", |c| &c.name).column("Name");
        d.field("status", |c| &c.status).column("Status");
        d.field("last_seen", |c| &c.last_seen).column("LastSeen");
        d.field("session_token", |c| &c.session_token).ignore();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bulk_upsert=info")),
        )
        .init();

    let options = UpsertOptions::from_env()?;
    let service = BulkUpsertService::new(Arc::new(SchemaRegistry::new()));

    let customers = vec![
        Customer {
            id: 1,
            name: "Ada".into(),
            status: Status::Active,
            last_seen: NaiveDateTime::parse_from_str("2026-10-01 09:30:00", "%Y-%m-%d %H:%M:%S").ok(),
            session_token: "t-1".into(),
        },
        Customer {
            id: 2,
            name: "Grace".into(),
            status: Status::Suspended,
            last_seen: None,
            session_token: "t-2".into(),
        },
    ];
    tracing::debug!(tokens = customers.iter().filter(|c| !c.session_token.is_empty()).count(), "session tokens skipped");

    let mut session = DryRunSession::new();
    let summary = service
        .bulk_insert_or_update(&mut session, &customers, &options)
        .await?;
    tracing::info!(
        table = %summary.table,
        rows = summary.rows_loaded,
        calls = session.calls().len(),
        state = ?summary.state,
        "dry run finished"
    );
    for sql in session.statements() {
        println!("{}\n", sql);
    }
    Ok(())
}
