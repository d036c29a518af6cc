//! Constant values that dialects render as SQL literals.

use chrono::NaiveDateTime;

/// A constant value embedded into rendered SQL.
///
/// Used by `Dialect::render_value` and `Dialect::constant_values` to build
/// small literal tables (e.g. a list of key ranges) without a round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlLiteral {
    /// SQL NULL.
    Null,
    /// Boolean, rendered as 1/0 on every engine.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// Floating point value. Non-finite values render as NULL.
    Float(f64),
    /// Text, escaped by the dialect.
    Text(String),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
}

impl From<i64> for SqlLiteral {
    fn from(v: i64) -> Self {
        SqlLiteral::Int(v)
    }
}

impl From<i32> for SqlLiteral {
    fn from(v: i32) -> Self {
        SqlLiteral::Int(v as i64)
    }
}

impl From<f64> for SqlLiteral {
    fn from(v: f64) -> Self {
        SqlLiteral::Float(v)
    }
}

impl From<bool> for SqlLiteral {
    fn from(v: bool) -> Self {
        SqlLiteral::Bool(v)
    }
}

impl From<&str> for SqlLiteral {
    fn from(v: &str) -> Self {
        SqlLiteral::Text(v.to_string())
    }
}

impl From<String> for SqlLiteral {
    fn from(v: String) -> Self {
        SqlLiteral::Text(v)
    }
}

impl From<NaiveDateTime> for SqlLiteral {
    fn from(v: NaiveDateTime) -> Self {
        SqlLiteral::Timestamp(v)
    }
}

impl<T: Into<SqlLiteral>> From<Option<T>> for SqlLiteral {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlLiteral::Null, Into::into)
    }
}
