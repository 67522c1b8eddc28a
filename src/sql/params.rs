//! Cell values handed to the bulk-load capability.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One cell of a staged row. Values travel through the bulk copy, never through SQL text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SqlValue {
    Null,
    Int(i32),
    BigInt(i64),
    SmallInt(i16),
    Text(String),
    Bit(bool),
    DateTime(NaiveDateTime),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Integer view of the value, widening `Int`/`SmallInt` the way a BIGINT column stores them.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(n) => Some(i64::from(*n)),
            SqlValue::BigInt(n) => Some(*n),
            SqlValue::SmallInt(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bit(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}
