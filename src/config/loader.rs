//! Resolve an entity's declarations into table and column metadata.

use crate::config::resolved::{Column, EntityConfiguration};
use crate::config::types::{Entity, EntityDescriptor, FieldAnnotation};
use crate::config::validate_identifiers;
use crate::error::ConfigError;
use std::collections::HashMap;

/// Table name and optional schema from the entity's table annotation.
pub fn resolve_table<E: Entity>() -> Result<(String, Option<String>), ConfigError> {
    table_of(&EntityDescriptor::<E>::collect())
}

/// Mapped columns in field declaration order. Fails closed on unannotated fields and on a
/// second primary key.
pub fn resolve_columns<E: Entity>() -> Result<Vec<Column<E>>, ConfigError> {
    columns_of(&EntityDescriptor::<E>::collect())
}

/// Full resolution: table, columns, derived names and identifier checks.
pub fn resolve<E: Entity>() -> Result<EntityConfiguration<E>, ConfigError> {
    let descriptor = EntityDescriptor::<E>::collect();
    let (table_name, schema) = table_of(&descriptor)?;
    let columns = columns_of(&descriptor)?;
    validate_identifiers(descriptor.type_name, &table_name, schema.as_deref(), &columns)?;
    tracing::debug!(
        entity = descriptor.type_name,
        table = %table_name,
        columns = columns.len(),
        "resolved entity configuration"
    );
    Ok(EntityConfiguration::new(descriptor.type_name, table_name, schema, columns))
}

fn table_of<E: 'static>(d: &EntityDescriptor<E>) -> Result<(String, Option<String>), ConfigError> {
    let table = d.table_annotation().ok_or(ConfigError::MissingTable {
        entity: d.type_name(),
    })?;
    let schema = table
        .schema
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    Ok((table.name.clone(), schema))
}

fn columns_of<E: 'static>(d: &EntityDescriptor<E>) -> Result<Vec<Column<E>>, ConfigError> {
    let entity = d.type_name();
    let mut columns: Vec<Column<E>> = Vec::with_capacity(d.fields().len());
    let mut primary_key: Option<&'static str> = None;
    let mut seen: HashMap<&str, &'static str> = HashMap::new();

    for field in d.fields() {
        let column = match &field.annotation {
            Some(FieldAnnotation::Column(c)) => c,
            Some(FieldAnnotation::Ignored) => continue,
            None => {
                return Err(ConfigError::UnmappedField {
                    entity,
                    field: field.field_name,
                })
            }
        };
        if column.primary_key {
            if let Some(existing) = primary_key {
                return Err(ConfigError::DuplicatePrimaryKey {
                    entity,
                    field: field.field_name,
                    existing,
                });
            }
            primary_key = Some(field.field_name);
        }
        if let Some(first) = seen.insert(column.name.as_str(), field.field_name) {
            return Err(ConfigError::DuplicateColumn {
                entity,
                column: column.name.clone(),
                first,
                second: field.field_name,
            });
        }
        columns.push(Column {
            name: column.name.clone(),
            field_name: field.field_name,
            value_type: field.value_type,
            is_primary_key: column.primary_key,
            accessor: field.accessor.clone(),
        });
    }
    Ok(columns)
}
