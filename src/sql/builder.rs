//! Builds the staging DDL and the MERGE statement from a resolved entity.
//! Identifiers come from validated declarations only; row values go through the bulk copy.

use crate::config::EntityConfiguration;
use crate::error::ScriptError;
use crate::sql::sql_type;

/// The two statements an upsert sends, rendered once per entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertScripts {
    pub create_temp_table: String,
    pub merge: String,
}

impl UpsertScripts {
    pub fn render<E>(entity: &EntityConfiguration<E>) -> Result<Self, ScriptError> {
        Ok(UpsertScripts {
            create_temp_table: create_temp_table_script(entity)?,
            merge: merge_script(entity)?,
        })
    }
}

/// `CREATE TABLE #Temp_T (\n\t c1 t1,\n\t c2 t2\n)\n` over every column, key included.
pub fn create_temp_table_script<E>(entity: &EntityConfiguration<E>) -> Result<String, ScriptError> {
    let lines = entity
        .columns
        .iter()
        .map(|c| -> Result<String, ScriptError> {
            Ok(format!("\t {} {}", c.name, sql_type(&c.name, &c.value_type)?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(
        "CREATE TABLE {} (\n{}\n)\n",
        entity.full_temp_table_name,
        lines.join(",\n")
    ))
}

/// `T.c=#Temp_T.c,...` over non-key columns.
pub fn set_clause_for_update<E>(entity: &EntityConfiguration<E>) -> String {
    entity
        .value_columns()
        .map(|c| {
            format!(
                "{}.{}={}.{}",
                entity.full_table_name, c.name, entity.full_temp_table_name, c.name
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// `ON T.pk = #Temp_T.pk`.
pub fn join_clause<E>(entity: &EntityConfiguration<E>) -> Result<String, ScriptError> {
    let pk = entity
        .primary_key()
        .ok_or_else(|| ScriptError::MissingPrimaryKey {
            table: entity.table_name.clone(),
        })?;
    Ok(format!(
        "ON {}.{} = {}.{}",
        entity.full_table_name, pk.name, entity.full_temp_table_name, pk.name
    ))
}

/// Non-key column names; positionally aligned with [`insert_value_list`].
pub fn insert_column_list<E>(entity: &EntityConfiguration<E>) -> String {
    entity
        .value_columns()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Non-key `#Temp_T.c` references; positionally aligned with [`insert_column_list`].
pub fn insert_value_list<E>(entity: &EntityConfiguration<E>) -> String {
    entity
        .value_columns()
        .map(|c| format!("{}.{}", entity.full_temp_table_name, c.name))
        .collect::<Vec<_>>()
        .join(",")
}

/// Upsert from the temp table into the target, then drop the temp table in the same batch.
/// Never deletes target rows. Key-only entities are rejected: both branches need a column.
pub fn merge_script<E>(entity: &EntityConfiguration<E>) -> Result<String, ScriptError> {
    let on = join_clause(entity)?;
    if entity.value_columns().next().is_none() {
        return Err(ScriptError::NoValueColumns {
            table: entity.table_name.clone(),
        });
    }
    Ok(format!(
        "MERGE INTO {target} WITH(HOLDLOCK) USING {temp} {on} \
         WHEN MATCHED THEN UPDATE SET {set} \
         WHEN NOT MATCHED BY TARGET THEN INSERT({cols}) VALUES({vals}); \
         DROP TABLE {temp};",
        target = entity.full_table_name,
        temp = entity.full_temp_table_name,
        on = on,
        set = set_clause_for_update(entity),
        cols = insert_column_list(entity),
        vals = insert_value_list(entity),
    ))
}
