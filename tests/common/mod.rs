#![allow(dead_code)]

use async_trait::async_trait;
use bulk_upsert::{BulkCopyOptions, Entity, EntityDescriptor, SessionError, SqlSession, SqlValue, TabularBuffer};
use std::collections::HashMap;
use std::time::Duration;

/// Routes library logs to the test harness; `RUST_LOG=bulk_upsert=debug` shows the SQL.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Person {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub nickname: Option<String>,
}

impl Person {
    pub fn new(id: i32, name: &str, age: i32) -> Self {
        Person {
            id,
            name: name.to_string(),
            age,
            nickname: None,
        }
    }
}

impl Entity for Person {
    fn describe(d: &mut EntityDescriptor<Self>) {
        d.table("People");
        d.field("id", |p| &p.id).column("Id").primary_key();
        d.field("name", |p| &p.name).column("Name");
        d.field("age", |p| &p.age).column("Age");
        d.field("nickname", |p| &p.nickname).ignore();
    }
}

/// Declares a field without annotating it.
pub struct Unmapped {
    pub id: i32,
    pub loose: String,
}

impl Entity for Unmapped {
    fn describe(d: &mut EntityDescriptor<Self>) {
        d.table("Unmapped");
        d.field("id", |u| &u.id).column("Id").primary_key();
        d.field("loose", |u| &u.loose);
    }
}

pub struct Keyless {
    pub name: String,
}

impl Entity for Keyless {
    fn describe(d: &mut EntityDescriptor<Self>) {
        d.table("Keyless");
        d.field("name", |k| &k.name).column("Name");
    }
}

/// Maps nothing but its key.
pub struct KeyOnly {
    pub id: i32,
}

impl Entity for KeyOnly {
    fn describe(d: &mut EntityDescriptor<Self>) {
        d.table("Tags");
        d.field("id", |k| &k.id).column("Id").primary_key();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Open,
    Create,
    BulkLoad,
    Merge,
    Close,
}

#[derive(Clone, Debug, Default)]
pub struct MemTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl MemTable {
    pub fn new(columns: &[&str]) -> Self {
        MemTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Row whose integer key column equals `key`.
    pub fn row_by_key(&self, column: &str, key: i64) -> Option<&Vec<SqlValue>> {
        let i = self.index(column)?;
        self.rows.iter().find(|r| r[i].as_i64() == Some(key))
    }
}

/// In-memory stand-in for a SQL Server session. Understands the temp table DDL, the bulk
/// copy and the MERGE batch the upsert emits; target keys are identity columns.
#[derive(Default)]
pub struct MemoryServer {
    open: bool,
    pub opens: usize,
    pub closes: usize,
    pub tables: HashMap<String, MemTable>,
    pub statements: Vec<String>,
    pub bulk_options: Vec<BulkCopyOptions>,
    pub fail_at: Option<Step>,
    pub stall_at: Option<Step>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_people(rows: &[(i64, &str, i64)]) -> Self {
        let mut server = Self::new();
        let mut people = MemTable::new(&["Id", "Name", "Age"]);
        for (id, name, age) in rows {
            people.rows.push(vec![
                SqlValue::BigInt(*id),
                SqlValue::Text(name.to_string()),
                SqlValue::BigInt(*age),
            ]);
        }
        server.tables.insert("People".into(), people);
        server
    }

    pub fn opened(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn stalling_at(mut self, step: Step) -> Self {
        self.stall_at = Some(step);
        self
    }

    pub fn table(&self, name: &str) -> Option<&MemTable> {
        self.tables.get(name)
    }

    async fn enter(&mut self, step: Step) -> Result<(), SessionError> {
        if self.stall_at == Some(step) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_at == Some(step) {
            return Err(format!("injected failure at {:?}", step).into());
        }
        Ok(())
    }

    fn create(&mut self, sql: &str) -> Result<u64, SessionError> {
        let name = sql.split_whitespace().nth(2).ok_or("malformed CREATE TABLE")?;
        if self.tables.contains_key(name) {
            return Err(format!("There is already an object named '{}' in the database.", name).into());
        }
        let columns: Vec<String> = sql
            .lines()
            .filter(|l| l.starts_with('\t'))
            .filter_map(|l| l.split_whitespace().next())
            .map(String::from)
            .collect();
        self.tables.insert(
            name.to_string(),
            MemTable {
                columns,
                rows: Vec::new(),
            },
        );
        Ok(0)
    }

    fn merge(&mut self, sql: &str) -> Result<u64, SessionError> {
        let target_name = token_after(sql, "MERGE INTO ")?;
        let temp_name = token_after(sql, "USING ")?;
        let on = token_after(sql, " ON ")?;
        let pk = on.rsplit('.').next().ok_or("malformed ON clause")?;
        let insert_cols: Vec<&str> = between(sql, "INSERT(", ")")?.split(',').filter(|c| !c.is_empty()).collect();

        let temp = self
            .tables
            .get(temp_name)
            .cloned()
            .ok_or_else(|| format!("Invalid object name '{}'.", temp_name))?;
        let target = self
            .tables
            .get_mut(target_name)
            .ok_or_else(|| format!("Invalid object name '{}'.", target_name))?;
        let target_pk = target.index(pk).ok_or("unknown key column")?;
        let temp_pk = temp.index(pk).ok_or("unknown key column")?;
        let mut next_identity = target.rows.iter().filter_map(|r| r[target_pk].as_i64()).max().unwrap_or(0) + 1;

        let mut affected = 0;
        for row in &temp.rows {
            let key = row[temp_pk].as_i64();
            let existing = target.rows.iter().position(|r| r[target_pk].as_i64() == key);
            let slot = match existing {
                Some(i) => i,
                None => {
                    let mut fresh = vec![SqlValue::Null; target.columns.len()];
                    fresh[target_pk] = SqlValue::BigInt(next_identity);
                    next_identity += 1;
                    target.rows.push(fresh);
                    target.rows.len() - 1
                }
            };
            for col in &insert_cols {
                let (Some(to), Some(from)) = (target.index(col), temp.index(col)) else {
                    return Err(format!("Invalid column name '{}'.", col).into());
                };
                target.rows[slot][to] = row[from].clone();
            }
            affected += 1;
        }

        if sql.contains(&format!("DROP TABLE {};", temp_name)) {
            self.tables.remove(temp_name);
        }
        Ok(affected)
    }
}

fn token_after<'a>(sql: &'a str, marker: &str) -> Result<&'a str, SessionError> {
    let start = sql.find(marker).ok_or_else(|| format!("missing '{}'", marker))? + marker.len();
    sql[start..]
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("nothing after '{}'", marker).into())
}

fn between<'a>(sql: &'a str, open: &str, close: &str) -> Result<&'a str, SessionError> {
    let start = sql.find(open).ok_or_else(|| format!("missing '{}'", open))? + open.len();
    let len = sql[start..].find(close).ok_or_else(|| format!("missing '{}'", close))?;
    Ok(&sql[start..start + len])
}

#[async_trait]
impl SqlSession for MemoryServer {
    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Open).await?;
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Close).await?;
        self.open = false;
        self.closes += 1;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, SessionError> {
        if !self.open {
            return Err("ExecuteNonQuery requires an open connection".into());
        }
        self.statements.push(sql.to_string());
        if sql.starts_with("CREATE TABLE ") {
            self.enter(Step::Create).await?;
            self.create(sql)
        } else if sql.starts_with("MERGE INTO ") {
            self.enter(Step::Merge).await?;
            self.merge(sql)
        } else {
            Err(format!("unsupported statement: {}", sql).into())
        }
    }

    async fn bulk_load(
        &mut self,
        destination: &str,
        rows: &TabularBuffer,
        options: &BulkCopyOptions,
    ) -> Result<u64, SessionError> {
        if !self.open {
            return Err("bulk copy requires an open connection".into());
        }
        self.bulk_options.push(options.clone());
        self.enter(Step::BulkLoad).await?;
        let table = self
            .tables
            .get_mut(destination)
            .ok_or_else(|| format!("Cannot access destination table '{}'.", destination))?;
        if table.columns != rows.columns {
            return Err("The given ColumnMapping does not match up with any column in the source or destination.".into());
        }
        table.rows.extend(rows.rows.iter().cloned());
        Ok(rows.len() as u64)
    }
}
