//! Field value types and their SQL Server column declarations.

use crate::error::ScriptError;
use crate::sql::SqlValue;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Runtime shape of a field's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int32,
    Int64,
    Text,
    Bool,
    DateTime,
    Float32,
    Decimal,
    Guid,
    /// Fieldless enum stored by discriminant.
    Enum,
    Int16,
    Float64,
    Bytes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub kind: ValueKind,
    pub nullable: bool,
    /// Rust type name, used in error messages.
    pub type_name: &'static str,
}

impl ValueType {
    pub const fn new(kind: ValueKind, nullable: bool, type_name: &'static str) -> Self {
        ValueType {
            kind,
            nullable,
            type_name,
        }
    }
}

/// A record field type that can be staged into a temp table.
///
/// Implemented for the supported scalar types and, generically, their `Option` forms. Fieldless
/// `Copy` enums opt in with [`impl_sql_enum!`](crate::impl_sql_enum).
pub trait SqlField {
    const VALUE_TYPE: ValueType;

    fn to_sql_value(&self) -> SqlValue;
}

macro_rules! sql_field {
    ($ty:ty, $name:literal, $kind:ident, |$v:ident| $conv:expr) => {
        impl SqlField for $ty {
            const VALUE_TYPE: ValueType = ValueType::new(ValueKind::$kind, false, $name);

            fn to_sql_value(&self) -> SqlValue {
                let $v = self;
                $conv
            }
        }
    };
}

/// Nullable form of any field type; `None` stages as `NULL`.
impl<T: SqlField> SqlField for Option<T> {
    const VALUE_TYPE: ValueType = ValueType::new(T::VALUE_TYPE.kind, true, T::VALUE_TYPE.type_name);

    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

sql_field!(i32, "i32", Int32, |v| SqlValue::Int(*v));
sql_field!(i64, "i64", Int64, |v| SqlValue::BigInt(*v));
sql_field!(String, "String", Text, |v| SqlValue::Text(v.clone()));
sql_field!(bool, "bool", Bool, |v| SqlValue::Bit(*v));
sql_field!(NaiveDateTime, "NaiveDateTime", DateTime, |v| SqlValue::DateTime(*v));
sql_field!(DateTime<Utc>, "DateTime<Utc>", DateTime, |v| SqlValue::DateTime(v.naive_utc()));
sql_field!(f32, "f32", Float32, |v| SqlValue::Float(*v));
sql_field!(Decimal, "Decimal", Decimal, |v| SqlValue::Decimal(*v));
sql_field!(Uuid, "Uuid", Guid, |v| SqlValue::Guid(*v));
// Carried as values, but without a column mapping.
sql_field!(i16, "i16", Int16, |v| SqlValue::SmallInt(*v));
sql_field!(f64, "f64", Float64, |v| SqlValue::Double(*v));
sql_field!(Vec<u8>, "Vec<u8>", Bytes, |v| SqlValue::Binary(v.clone()));

/// Implements [`SqlField`] for fieldless `Copy` enums, staging them as `INT`
/// discriminants. `Option<Enum>` is covered by the blanket `Option` impl, so the
/// macro only touches the caller's own type and works from any crate.
#[macro_export]
macro_rules! impl_sql_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::sql::SqlField for $ty {
                const VALUE_TYPE: $crate::sql::ValueType =
                    $crate::sql::ValueType::new($crate::sql::ValueKind::Enum, false, stringify!($ty));

                fn to_sql_value(&self) -> $crate::sql::SqlValue {
                    $crate::sql::SqlValue::Int(*self as i32)
                }
            }
        )+
    };
}

/// SQL Server column declaration for a field's value type.
///
/// Nullable variants drop the `NOT NULL` suffix; text is always nullable. There is no
/// widening: types outside the table fail with [`ScriptError::UnsupportedType`].
pub fn sql_type(column: &str, value_type: &ValueType) -> Result<&'static str, ScriptError> {
    let (not_null, nullable) = match value_type.kind {
        ValueKind::Int32 | ValueKind::Int64 => ("BIGINT NOT NULL", "BIGINT"),
        ValueKind::Text => ("NVARCHAR(MAX)", "NVARCHAR(MAX)"),
        ValueKind::Bool => ("BIT NOT NULL", "BIT"),
        ValueKind::DateTime => ("DATETIME NOT NULL", "DATETIME"),
        ValueKind::Float32 => ("FLOAT NOT NULL", "FLOAT"),
        ValueKind::Decimal => ("DECIMAL(18,0) NOT NULL", "DECIMAL(18,0)"),
        ValueKind::Guid => ("UNIQUEIDENTIFIER NOT NULL", "UNIQUEIDENTIFIER"),
        ValueKind::Enum => ("INT NOT NULL", "INT"),
        ValueKind::Int16 | ValueKind::Float64 | ValueKind::Bytes => {
            return Err(ScriptError::UnsupportedType {
                column: column.to_string(),
                type_name: value_type.type_name,
            })
        }
    };
    Ok(if value_type.nullable { nullable } else { not_null })
}
