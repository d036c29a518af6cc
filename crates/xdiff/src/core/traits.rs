//! The dialect contract.
//!
//! A [`Dialect`] turns abstract query intents into SQL text for one engine.
//! Implementations hold no mutable state: one instance per engine kind is
//! shared read-only by every connection and worker thread.
//!
//! # Design Pattern
//!
//! This is a **Strategy** pattern - engine implementations provide
//! interchangeable rendering rules behind one trait, and the
//! [`DialectCatalog`](super::DialectCatalog) maps engine identifiers to them.
//! Methods with a single obvious rendering shared by most engines are
//! provided as default methods (Template Method).
//!
//! # Rendering rules
//!
//! - Every method is pure and idempotent: same input, same output.
//! - Identifiers and literals are escaped before they are embedded; names
//!   that cannot be escaped safely are rejected with `DiffError::Config`.
//! - Expressions passed in (`expr`, `a`, `b`, `items`) are SQL fragments
//!   built by the caller and are embedded verbatim.

use std::fmt::Debug;

use chrono::NaiveDateTime;

use crate::dialect::{
    ColumnType, DefaultTypes, FractionalType, TemporalType, TypeNormalizer, TypeRules,
};
use crate::error::{DiffError, Result};

use super::identifier;
use super::schema::{IdentifierCase, RawColumnInfo, TablePath};
use super::value::SqlLiteral;

/// SQL rendering rules for one database engine.
pub trait Dialect: Send + Sync + Debug {
    // ===== Engine properties =====

    /// Dialect identifier (e.g. "oceanbase", "postgres").
    fn name(&self) -> &str;

    /// Whether the engine rounds values that exceed a column's precision
    /// (as opposed to truncating them).
    fn rounds_on_precision_loss(&self) -> bool;

    /// Whether primary keys can be declared on this engine.
    fn supports_primary_key(&self) -> bool {
        true
    }

    /// Whether secondary indexes can be declared on this engine.
    fn supports_indexes(&self) -> bool {
        true
    }

    /// Table used for `SELECT <constants> FROM ...` on engines that require
    /// a FROM clause (`DUAL` on Oracle-family engines).
    fn placeholder_table(&self) -> Option<&str> {
        None
    }

    /// How the engine folds unquoted identifiers.
    fn identifier_case(&self) -> IdentifierCase;

    /// Schema used for one-component table paths when the connection does
    /// not configure one.
    fn default_schema(&self, user: &str, database: &str) -> String;

    // ===== Quoting =====

    /// Wrap `name` in the engine's identifier quotes, escaping as needed.
    fn quote_identifier(&self, name: &str) -> Result<String>;

    /// Render a string literal.
    fn quote_literal(&self, value: &str) -> Result<String> {
        identifier::quote_literal(value)
    }

    // ===== Query shapes =====

    /// Fixed-width text type used by [`to_text`](Dialect::to_text).
    fn text_type(&self) -> &str;

    /// Cast `expr` to the engine's fixed-width text type.
    fn to_text(&self, expr: &str) -> String;

    /// Wrap `query` in the engine's row-limiting syntax.
    ///
    /// # Errors
    ///
    /// Returns `DiffError::Unsupported` when a non-zero offset is requested
    /// and the engine has no offset syntax. Callers must choose another strategy.
    fn paginate(&self, query: &str, offset: Option<u64>, limit: Option<u64>) -> Result<String>;

    /// Concatenate string expressions in order. No items render the empty
    /// string literal.
    fn concat(&self, items: &[String]) -> String;

    /// Render a timestamp constant with the engine's literal syntax.
    fn literal_timestamp(&self, t: &NaiveDateTime) -> String;

    /// Call the engine's pseudo-random generator.
    fn random(&self) -> String;

    /// NULL-safe inequality: NULL/NULL is false, NULL/x is true.
    fn is_distinct_from(&self, a: &str, b: &str) -> String;

    /// Fixed-width integer digest of `expr`: the last
    /// [`CHECKSUM_HEXDIGITS`](crate::dialect::CHECKSUM_HEXDIGITS) hex
    /// digits of its MD5, minus
    /// [`CHECKSUM_OFFSET`](crate::dialect::CHECKSUM_OFFSET).
    ///
    /// Identical bytes must give identical integers on every engine; see
    /// [`crate::checksum::md5_as_int`] for the reference computation.
    fn hash_to_int(&self, expr: &str) -> String;

    /// The same digest as [`hash_to_int`](Dialect::hash_to_int), as
    /// lowercase hex without the offset.
    fn hash_to_hex(&self, expr: &str) -> String;

    // ===== Value normalization =====

    /// Canonical text form of a UUID: trimmed, lowercase, 36 characters.
    fn normalize_uuid(&self, expr: &str) -> String;

    /// `YYYY-MM-DD HH:MM:SS.ffffff` with the fraction kept to the column's
    /// precision and right-padded with zeros to six digits.
    fn normalize_timestamp(&self, expr: &str, t: &TemporalType) -> String;

    /// Decimal text with exactly `scale` fractional digits.
    fn normalize_number(&self, expr: &str, t: &FractionalType) -> String;

    /// Normalize any column by its canonical type.
    fn normalize_value(&self, expr: &str, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Decimal(f) | ColumnType::Float(f) => self.normalize_number(expr, f),
            ColumnType::Timestamp(t) | ColumnType::TimestampTz(t) => {
                self.normalize_timestamp(expr, t)
            }
            ColumnType::Uuid => self.normalize_uuid(expr),
            ColumnType::Integer | ColumnType::Text | ColumnType::Unknown(_) => self.to_text(expr),
        }
    }

    // ===== Session =====

    /// Statement pinning the session time zone to UTC.
    fn set_session_timezone_utc(&self) -> Result<String> {
        self.set_session_timezone("UTC")
    }

    /// Statement pinning the session time zone to `zone`.
    ///
    /// # Errors
    ///
    /// `DiffError::Unsupported` on engines without a session time zone;
    /// `DiffError::Config` if `zone` cannot be embedded safely.
    fn set_session_timezone(&self, zone: &str) -> Result<String>;

    /// The engine's session-local "now".
    fn current_timestamp(&self) -> String;

    // ===== Schema =====

    /// Ordered pattern rules tried before the default table.
    fn type_rules(&self) -> &TypeRules;

    /// Default raw type name → canonical kind table.
    fn default_types(&self) -> DefaultTypes;

    /// Resolve the canonical type of a column. Never fails.
    fn parse_type(&self, table_path: &TablePath, info: &RawColumnInfo) -> ColumnType {
        TypeNormalizer::new(
            self.type_rules(),
            self.default_types(),
            self.rounds_on_precision_loss(),
        )
        .parse_type(table_path, info)
    }

    /// Split `path` into case-folded `(schema, table)`.
    ///
    /// One-component paths use `default_schema`.
    fn normalize_table_path(
        &self,
        path: &TablePath,
        default_schema: &str,
    ) -> Result<(String, String)> {
        let case = self.identifier_case();
        match path.parts() {
            [table] => Ok((case.apply(default_schema), case.apply(table))),
            [schema, table] => Ok((case.apply(schema), case.apply(table))),
            _ => Err(DiffError::Config(format!(
                "{}: Bad table path '{}'. Expected form: schema.table",
                self.name(),
                path
            ))),
        }
    }

    /// Quoted `schema.table` reference using the same normalization as
    /// [`schema_query`](Dialect::schema_query).
    fn qualify_table(&self, path: &TablePath, default_schema: &str) -> Result<String> {
        let (schema, table) = self.normalize_table_path(path, default_schema)?;
        Ok(format!(
            "{}.{}",
            self.quote_identifier(&schema)?,
            self.quote_identifier(&table)?
        ))
    }

    /// Information-schema query listing the columns of `path`.
    ///
    /// Result columns, in order: column name, data type, datetime
    /// precision, numeric precision, numeric scale.
    fn schema_query(&self, path: &TablePath, default_schema: &str) -> Result<String>;

    // ===== Constants =====

    /// Render one constant.
    fn render_value(&self, value: &SqlLiteral) -> Result<String> {
        Ok(match value {
            SqlLiteral::Null => "NULL".to_string(),
            SqlLiteral::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            SqlLiteral::Int(i) => i.to_string(),
            SqlLiteral::Float(f) if f.is_finite() => format!("{:?}", f),
            SqlLiteral::Float(_) => "NULL".to_string(),
            SqlLiteral::Text(s) => self.quote_literal(s)?,
            SqlLiteral::Timestamp(t) => self.literal_timestamp(t),
        })
    }

    /// A literal table of `rows`, one `SELECT` per row joined by `UNION ALL`.
    ///
    /// # Errors
    ///
    /// `DiffError::Config` when `rows` is empty or a text value cannot be
    /// embedded.
    fn constant_values(&self, rows: &[Vec<SqlLiteral>]) -> Result<String> {
        if rows.is_empty() {
            return Err(DiffError::Config(
                "constant_values requires at least one row".to_string(),
            ));
        }
        let from = self
            .placeholder_table()
            .map(|t| format!(" FROM {}", t))
            .unwrap_or_default();

        let selects = rows
            .iter()
            .map(|row| {
                let values = row
                    .iter()
                    .map(|v| self.render_value(v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("SELECT {}{}", values.join(", "), from))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(selects.join(" UNION ALL "))
    }
}
