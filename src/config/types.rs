//! Declarations attached to a record type: table annotation and per-field column annotations.

use crate::sql::{SqlField, SqlValue, ValueType};
use std::sync::Arc;

/// A record type that maps to one table row.
///
/// `describe` is the explicit schema-description step: it declares the table and every
/// field of the record, in declaration order. A field that is declared but neither mapped
/// to a column nor ignored is a configuration error.
///
/// ```ignore
/// impl Entity for Person {
///     fn describe(d: &mut EntityDescriptor<Self>) {
///         d.table("People").schema("dbo");
///         d.field("id", |p| &p.id).column("Id").primary_key();
///         d.field("name", |p| &p.name).column("Name");
///         d.field("scratch", |p| &p.scratch).ignore();
///     }
/// }
/// ```
pub trait Entity: Send + Sync + Sized + 'static {
    fn describe(d: &mut EntityDescriptor<Self>);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableAnnotation {
    pub name: String,
    pub schema: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnAnnotation {
    pub name: String,
    pub primary_key: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldAnnotation {
    Column(ColumnAnnotation),
    Ignored,
}

pub(crate) type Accessor<E> = Arc<dyn Fn(&E) -> SqlValue + Send + Sync>;

pub struct FieldDeclaration<E> {
    pub field_name: &'static str,
    pub value_type: ValueType,
    pub annotation: Option<FieldAnnotation>,
    pub(crate) accessor: Accessor<E>,
}

impl<E> FieldDeclaration<E> {
    pub fn value(&self, record: &E) -> SqlValue {
        (self.accessor)(record)
    }
}

/// Collects the declarations made by [`Entity::describe`].
pub struct EntityDescriptor<E> {
    pub(crate) type_name: &'static str,
    pub(crate) table: Option<TableAnnotation>,
    pub(crate) fields: Vec<FieldDeclaration<E>>,
}

impl<E: Entity> EntityDescriptor<E> {
    pub(crate) fn collect() -> Self {
        let mut d = EntityDescriptor {
            type_name: std::any::type_name::<E>(),
            table: None,
            fields: Vec::new(),
        };
        E::describe(&mut d);
        d
    }
}

impl<E: 'static> EntityDescriptor<E> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_annotation(&self) -> Option<&TableAnnotation> {
        self.table.as_ref()
    }

    pub fn fields(&self) -> &[FieldDeclaration<E>] {
        &self.fields
    }

    /// Table annotation. A later call replaces an earlier one.
    pub fn table(&mut self, name: impl Into<String>) -> TableBuilder<'_> {
        let table = self.table.insert(TableAnnotation {
            name: name.into(),
            schema: None,
        });
        TableBuilder { table }
    }

    /// Declares the next field. Chain `.column(..)`, `.primary_key()` or `.ignore()` to annotate it.
    pub fn field<T>(&mut self, field_name: &'static str, get: for<'a> fn(&'a E) -> &'a T) -> FieldBuilder<'_, E>
    where
        T: SqlField + 'static,
    {
        self.fields.push(FieldDeclaration {
            field_name,
            value_type: T::VALUE_TYPE,
            annotation: None,
            accessor: Arc::new(move |record: &E| get(record).to_sql_value()),
        });
        let last = self.fields.len() - 1;
        FieldBuilder {
            field: &mut self.fields[last],
        }
    }
}

pub struct TableBuilder<'a> {
    table: &'a mut TableAnnotation,
}

impl TableBuilder<'_> {
    pub fn schema(self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }
}

pub struct FieldBuilder<'a, E> {
    field: &'a mut FieldDeclaration<E>,
}

impl<E> FieldBuilder<'_, E> {
    /// Maps the field to the destination column `name`.
    pub fn column(self, name: impl Into<String>) -> Self {
        let primary_key = matches!(
            &self.field.annotation,
            Some(FieldAnnotation::Column(c)) if c.primary_key
        );
        self.field.annotation = Some(FieldAnnotation::Column(ColumnAnnotation {
            name: name.into(),
            primary_key,
        }));
        self
    }

    /// Marks the column as the entity's primary key. Without a prior `.column(..)` the
    /// column takes the field's name.
    pub fn primary_key(self) -> Self {
        match &mut self.field.annotation {
            Some(FieldAnnotation::Column(c)) => c.primary_key = true,
            other => {
                *other = Some(FieldAnnotation::Column(ColumnAnnotation {
                    name: self.field.field_name.to_string(),
                    primary_key: true,
                }))
            }
        }
        self
    }

    /// Excludes the field from the mapping.
    pub fn ignore(self) -> Self {
        self.field.annotation = Some(FieldAnnotation::Ignored);
        self
    }
}
