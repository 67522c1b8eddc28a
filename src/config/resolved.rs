//! Resolved entity model: declarations validated and flattened for script generation.

use crate::config::types::Accessor;
use crate::error::ScriptError;
use crate::sql::{SqlValue, UpsertScripts, ValueType};
use std::fmt;
use std::sync::OnceLock;

/// Prefix of the session-scoped staging table.
pub const TEMP_TABLE_PREFIX: &str = "#Temp_";

/// `#Temp_<table>`; a bracketed table name keeps the brackets around the whole name,
/// so `[Order Details]` stages into `[#Temp_Order Details]`.
pub fn temp_table_name_for(table_name: &str) -> String {
    match table_name.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        Some(inner) => format!("[{}{}]", TEMP_TABLE_PREFIX, inner),
        None => format!("{}{}", TEMP_TABLE_PREFIX, table_name),
    }
}

/// One field mapped to one destination column.
pub struct Column<E> {
    pub name: String,
    pub field_name: &'static str,
    pub value_type: ValueType,
    pub is_primary_key: bool,
    pub(crate) accessor: Accessor<E>,
}

impl<E> Column<E> {
    pub fn value(&self, record: &E) -> SqlValue {
        (self.accessor)(record)
    }
}

impl<E> Clone for Column<E> {
    fn clone(&self) -> Self {
        Column {
            name: self.name.clone(),
            field_name: self.field_name,
            value_type: self.value_type,
            is_primary_key: self.is_primary_key,
            accessor: self.accessor.clone(),
        }
    }
}

impl<E> fmt::Debug for Column<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("field_name", &self.field_name)
            .field("value_type", &self.value_type)
            .field("is_primary_key", &self.is_primary_key)
            .finish()
    }
}

/// Per-type table and column metadata. Immutable once built; the rendered scripts are
/// memoized on first use.
pub struct EntityConfiguration<E> {
    pub type_name: &'static str,
    pub table_name: String,
    pub schema: Option<String>,
    pub full_table_name: String,
    pub temp_table_name: String,
    pub full_temp_table_name: String,
    /// Declaration order; drives the order of every generated clause.
    pub columns: Vec<Column<E>>,
    scripts: OnceLock<Result<UpsertScripts, ScriptError>>,
}

impl<E> EntityConfiguration<E> {
    pub(crate) fn new(
        type_name: &'static str,
        table_name: String,
        schema: Option<String>,
        columns: Vec<Column<E>>,
    ) -> Self {
        let full_table_name = match &schema {
            Some(s) => format!("{}.{}", s, table_name),
            None => table_name.clone(),
        };
        // Temp tables live in tempdb, so the schema never qualifies them.
        let temp_table_name = temp_table_name_for(&table_name);
        EntityConfiguration {
            type_name,
            full_temp_table_name: temp_table_name.clone(),
            temp_table_name,
            full_table_name,
            table_name,
            schema,
            columns,
            scripts: OnceLock::new(),
        }
    }

    pub fn primary_key(&self) -> Option<&Column<E>> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Non-key columns, in declaration order. Shared by the SET clause and both insert lists.
    pub fn value_columns(&self) -> impl Iterator<Item = &Column<E>> {
        self.columns.iter().filter(|c| !c.is_primary_key)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// CREATE TABLE and MERGE scripts, rendered once per configuration.
    pub fn scripts(&self) -> Result<&UpsertScripts, ScriptError> {
        self.scripts
            .get_or_init(|| UpsertScripts::render(self))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl<E> fmt::Debug for EntityConfiguration<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityConfiguration")
            .field("type_name", &self.type_name)
            .field("full_table_name", &self.full_table_name)
            .field("full_temp_table_name", &self.full_temp_table_name)
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_name_prefixes_the_bare_table_name() {
        assert_eq!(temp_table_name_for("People"), "#Temp_People");
        assert_eq!(temp_table_name_for("[Order Details]"), "[#Temp_Order Details]");
        assert_eq!(temp_table_name_for("[Orders]"), "[#Temp_Orders]");
    }
}
